use crate::backend::Backend;
use crate::error::TarError;

/// Memory medium: an owned growable buffer plus its physical position.
///
/// The buffer grows to exactly the new high water mark on writes past the
/// end. The access pattern is append sequential, so there is no exponential
/// growth policy.
pub struct MemBackend {
    buf: Vec<u8>,
    pos: usize,
}

impl MemBackend {
    /// Empty medium, no buffer allocated yet.
    pub fn new() -> MemBackend {
        MemBackend {
            buf: Vec::new(),
            pos: 0,
        }
    }

    /// Medium initialized with a copy of `data`. The source buffer is
    /// independent of the medium afterwards.
    pub fn with_data(data: &[u8]) -> MemBackend {
        MemBackend {
            buf: data.to_vec(),
            pos: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for MemBackend {
    fn default() -> Self {
        MemBackend::new()
    }
}

impl Backend for MemBackend {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), TarError> {
        let end = self.pos + buf.len();
        if end > self.buf.len() {
            return Err(TarError::ReadFailure);
        }
        buf.copy_from_slice(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TarError> {
        if data.is_empty() {
            return Ok(());
        }
        let end = self.pos + data.len();
        if end > self.buf.len() {
            self.buf.reserve_exact(end - self.buf.len());
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> Result<(), TarError> {
        if pos > self.buf.len() as u64 {
            return Err(TarError::SeekFailure);
        }
        self.pos = pos as usize;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TarError> {
        self.buf = Vec::new();
        self.pos = 0;
        Ok(())
    }
}

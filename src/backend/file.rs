use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::backend::Backend;
use crate::error::TarError;

/// File medium: delegates to the platform's file I/O, the OS tracks the
/// physical position. The handle is held in an Option so close can release
/// it while the backend value is still owned by the archive.
pub struct FileBackend {
    file: Option<File>,
}

impl FileBackend {
    pub fn open_read<P: AsRef<Path>>(path: P) -> Result<FileBackend, TarError> {
        let file = File::open(path).map_err(|_| TarError::OpenFailure)?;
        Ok(FileBackend { file: Some(file) })
    }

    pub fn create<P: AsRef<Path>>(path: P) -> Result<FileBackend, TarError> {
        let file = File::create(path).map_err(|_| TarError::OpenFailure)?;
        Ok(FileBackend { file: Some(file) })
    }

    /// Append mode: every write lands at the end of the file regardless of
    /// the seek position, as with a stream opened `"ab"`.
    pub fn append<P: AsRef<Path>>(path: P) -> Result<FileBackend, TarError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|_| TarError::OpenFailure)?;
        Ok(FileBackend { file: Some(file) })
    }
}

impl Backend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), TarError> {
        let file = self.file.as_mut().ok_or(TarError::ReadFailure)?;
        file.read_exact(buf).map_err(|_| TarError::ReadFailure)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TarError> {
        let file = self.file.as_mut().ok_or(TarError::WriteFailure)?;
        file.write_all(data).map_err(|_| TarError::WriteFailure)
    }

    fn seek(&mut self, pos: u64) -> Result<(), TarError> {
        let file = self.file.as_mut().ok_or(TarError::SeekFailure)?;
        file.seek(SeekFrom::Start(pos))
            .map(|_| ())
            .map_err(|_| TarError::SeekFailure)
    }

    fn close(&mut self) -> Result<(), TarError> {
        // Dropping the handle closes it
        self.file.take();
        Ok(())
    }
}

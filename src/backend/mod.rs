pub mod file;
pub mod mem;

use crate::error::TarError;

/// Raw byte-block capability set bound to one underlying medium instance.
///
/// `read` and `write` are all or nothing: a short read or short write is a
/// failure, never a partial success. `seek` takes an absolute offset. After
/// `close` the medium is released and the handle must not be reused.
pub trait Backend {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), TarError>;
    fn write(&mut self, data: &[u8]) -> Result<(), TarError>;
    fn seek(&mut self, pos: u64) -> Result<(), TarError>;
    fn close(&mut self) -> Result<(), TarError>;
}

//! Minimal tar-like archive reader/writer
//!
//! A flat, sequentially scanned container of named byte blobs: each entry
//! is one fixed 512 byte checksummed header record followed by its payload,
//! NUL padded to the next block boundary, with two null records terminating
//! the archive. The same operations run over a file stream or an in-memory
//! buffer, selected by the [`Backend`] chosen at open time.
//!
//! There is no magic or version field. The layout is structurally close to
//! ustar but deliberately narrower, so do not expect interoperability with
//! generic tar tooling.
//!
//! Handles are strictly single threaded, synchronous and blocking. One
//! handle owns one cursor and one backend; callers needing parallelism open
//! independent handles over separate media.

pub mod archive;
pub mod backend;
pub mod error;
pub mod header;

pub use archive::Tar;
pub use backend::file::FileBackend;
pub use backend::mem::MemBackend;
pub use backend::Backend;
pub use error::TarError;
pub use header::{EntryType, Header, BLOCK_SIZE, NAME_MAX, SIZE_MAX};

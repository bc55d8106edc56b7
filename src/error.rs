use thiserror::Error;

/// Every failure the archive layer can report. `NullRecord` and `NotFound`
/// are expected control-flow outcomes (end of archive, lookup miss), the
/// rest are malformed-archive or medium faults.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum TarError {
    #[error("could not open")]
    OpenFailure,
    #[error("could not read")]
    ReadFailure,
    #[error("could not write")]
    WriteFailure,
    #[error("could not seek")]
    SeekFailure,
    #[error("bad checksum")]
    BadChecksum,
    #[error("null record")]
    NullRecord,
    #[error("file not found")]
    NotFound,
    #[error("name too long")]
    NameTooLong,
    #[error("file too large")]
    TooLarge,
}

//! Archive cursor and sequential access state machine
//!
//! One [`Tar`] handle owns one backend and the cursor state for it: the
//! current stream position, the payload bytes still pending for the entry
//! in progress, and the offset of the most recently parsed header. Every
//! operation keeps the invariant that the stream position matches the
//! logical cursor.
//!
//! The cursor is either idle at a header (`remaining_data == 0`) or mid
//! payload (`remaining_data > 0`). Header reads seek back to the header
//! they parsed, and a completed payload read seeks back there too, so
//! `read_header` / `next` / `find` can always be issued immediately after
//! a data read completes.

use std::path::Path;

use log::debug;

use crate::backend::file::FileBackend;
use crate::backend::mem::MemBackend;
use crate::backend::Backend;
use crate::error::TarError;
use crate::header::{Header, BLOCK_SIZE, NAME_MAX};

const ZERO_BLOCK: [u8; BLOCK_SIZE] = [0; BLOCK_SIZE];

fn round_up(n: u64, incr: u64) -> u64 {
    n + (incr - n % incr) % incr
}

/// One open archive: a cursor over a byte-block backend.
pub struct Tar<B: Backend> {
    backend: B,
    pos: u64,
    remaining_data: u64,
    last_header: u64,
}

impl Tar<FileBackend> {
    /// Open an archive file for reading. The stream must begin with a well
    /// formed record or a null record (an empty finalized archive); any
    /// other codec or backend error fails the open.
    pub fn open_read<P: AsRef<Path>>(path: P) -> Result<Tar<FileBackend>, TarError> {
        let mut tar = Tar::from_backend(FileBackend::open_read(path)?);
        match tar.read_header() {
            Ok(_) | Err(TarError::NullRecord) => Ok(tar),
            Err(e) => Err(e),
        }
    }

    /// Create or truncate an archive file for writing.
    pub fn open_write<P: AsRef<Path>>(path: P) -> Result<Tar<FileBackend>, TarError> {
        Ok(Tar::from_backend(FileBackend::create(path)?))
    }

    /// Open an archive file with writes landing at the end.
    pub fn open_append<P: AsRef<Path>>(path: P) -> Result<Tar<FileBackend>, TarError> {
        Ok(Tar::from_backend(FileBackend::append(path)?))
    }
}

impl Tar<MemBackend> {
    /// Empty memory backed archive, for writing.
    pub fn open_memory() -> Tar<MemBackend> {
        Tar::from_backend(MemBackend::new())
    }

    /// Memory backed archive over a copy of an existing byte sequence.
    pub fn from_buffer(data: &[u8]) -> Tar<MemBackend> {
        Tar::from_backend(MemBackend::with_data(data))
    }
}

impl<B: Backend> Tar<B> {
    /// Open over any medium. The cursor starts at position zero.
    pub fn from_backend(backend: B) -> Tar<B> {
        Tar {
            backend,
            pos: 0,
            remaining_data: 0,
            last_header: 0,
        }
    }

    /// Release the backend, surfacing any release error. Dropping the
    /// handle releases the medium as well, this is for callers that want
    /// the error.
    pub fn close(mut self) -> Result<(), TarError> {
        self.backend.close()
    }

    /// Hand back the backend, cursor state is discarded.
    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Absolute seek, mirrored into the logical cursor.
    pub fn seek(&mut self, pos: u64) -> Result<(), TarError> {
        self.backend.seek(pos)?;
        self.pos = pos;
        Ok(())
    }

    /// Back to the start of the archive, clearing any in-progress entry
    /// state.
    pub fn rewind(&mut self) -> Result<(), TarError> {
        self.remaining_data = 0;
        self.last_header = 0;
        self.seek(0)
    }

    /// Parse the record at the cursor and return its header, leaving the
    /// cursor on the record so it can be re-read or followed by a data
    /// read. [`TarError::NullRecord`] signals the end of the archive.
    pub fn read_header(&mut self) -> Result<Header, TarError> {
        self.last_header = self.pos;

        let mut raw = [0u8; BLOCK_SIZE];
        self.tread(&mut raw)?;
        self.seek(self.last_header)?;

        Header::decode(&raw)
    }

    /// Skip to the record after the current one, discarding any partially
    /// consumed payload state.
    pub fn next(&mut self) -> Result<(), TarError> {
        let header = self.read_header()?;
        let skip = round_up(header.size, BLOCK_SIZE as u64) + BLOCK_SIZE as u64;
        debug!("next: {} +{}", header.name, skip);
        self.remaining_data = 0;
        self.seek(self.pos + skip)
    }

    /// Read payload bytes of the entry at the cursor. The first call for
    /// an entry initializes the pending byte count from the header; when
    /// the payload is fully consumed the cursor is restored to the entry's
    /// header.
    ///
    /// Callers must not request more bytes than the entry has remaining:
    /// the excess is not range checked here and surfaces, if at all, as a
    /// backend `ReadFailure` once the medium runs out.
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<(), TarError> {
        // First read for this entry: learn the size, step past the header
        if self.remaining_data == 0 {
            let header = self.read_header()?;
            self.seek(self.pos + BLOCK_SIZE as u64)?;
            self.remaining_data = header.size;
        }

        self.tread(buf)?;
        self.remaining_data = self.remaining_data.saturating_sub(buf.len() as u64);

        if self.remaining_data == 0 {
            return self.seek(self.last_header);
        }
        Ok(())
    }

    /// Scan from the start of the archive for an entry named `name`. On a
    /// hit the cursor is left at that entry's header. A scan that reaches
    /// the null record fails with [`TarError::NotFound`].
    pub fn find(&mut self, name: &str) -> Result<Header, TarError> {
        if name.len() > NAME_MAX {
            return Err(TarError::NameTooLong);
        }

        debug!("find: {}", name);
        self.rewind()?;
        loop {
            let header = match self.read_header() {
                Ok(h) => h,
                Err(TarError::NullRecord) => return Err(TarError::NotFound),
                Err(e) => return Err(e),
            };
            if header.name == name {
                return Ok(header);
            }
            self.next()?;
        }
    }

    /// Encode and write one header record. The pending payload count is
    /// set to the declared size before any data is written.
    ///
    /// Callers must write exactly `size` payload bytes before the next
    /// header; the library does not defend against a stale in-progress
    /// entry.
    pub fn write_header(&mut self, header: &Header) -> Result<(), TarError> {
        let raw = header.encode()?;
        debug!("write_header: {} ({} bytes)", header.name, header.size);
        self.remaining_data = header.size;
        self.twrite(&raw)
    }

    /// Shorthand: regular file entry of `size` payload bytes.
    pub fn write_file_header(&mut self, name: &str, size: u64) -> Result<(), TarError> {
        self.write_header(&Header::file(name, size))
    }

    /// Shorthand: directory marker entry.
    pub fn write_dir_header(&mut self, name: &str) -> Result<(), TarError> {
        self.write_header(&Header::dir(name))
    }

    /// Write payload bytes for the entry in progress. When the declared
    /// size has been fully written, NUL padding is appended up to the next
    /// block boundary so every entry stays block aligned.
    pub fn write_data(&mut self, data: &[u8]) -> Result<(), TarError> {
        self.twrite(data)?;
        self.remaining_data = self.remaining_data.saturating_sub(data.len() as u64);

        if self.remaining_data == 0 {
            let pad = round_up(self.pos, BLOCK_SIZE as u64) - self.pos;
            self.twrite(&ZERO_BLOCK[..pad as usize])?;
        }
        Ok(())
    }

    /// Terminate the archive with two consecutive null records.
    pub fn finalize(&mut self) -> Result<(), TarError> {
        debug!("finalize");
        self.twrite(&ZERO_BLOCK)?;
        self.twrite(&ZERO_BLOCK)
    }

    fn tread(&mut self, buf: &mut [u8]) -> Result<(), TarError> {
        self.backend.read(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn twrite(&mut self, data: &[u8]) -> Result<(), TarError> {
        self.backend.write(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }
}


#[cfg(test)]
mod test_archive {
    use super::*;
    use crate::header::EntryType;

    const STR1: &[u8] = b"Hello world";
    const STR2: &[u8] = b"Goodbye world";

    // Write the two fixed sample entries plus terminator, hand back the
    // archive bytes
    fn sample_archive() -> Vec<u8> {
        let mut tar = Tar::open_memory();
        tar.write_file_header("test1.txt", STR1.len() as u64).unwrap();
        tar.write_data(STR1).unwrap();
        tar.write_file_header("test2.txt", STR2.len() as u64).unwrap();
        tar.write_data(STR2).unwrap();
        tar.finalize().unwrap();
        tar.into_inner().into_inner()
    }

    #[test]
    fn write_read_back_in_order() {
        let mut tar = Tar::from_buffer(&sample_archive());

        let h1 = tar.read_header().unwrap();
        assert_eq!(h1.name, "test1.txt");
        assert_eq!(h1.size, STR1.len() as u64);
        assert_eq!(h1.typ, EntryType::Regular);

        let mut buf1 = vec![0u8; h1.size as usize];
        tar.read_data(&mut buf1).unwrap();
        assert_eq!(buf1, STR1);

        tar.next().unwrap();
        let h2 = tar.read_header().unwrap();
        assert_eq!(h2.name, "test2.txt");
        assert_eq!(h2.size, STR2.len() as u64);

        let mut buf2 = vec![0u8; h2.size as usize];
        tar.read_data(&mut buf2).unwrap();
        assert_eq!(buf2, STR2);

        tar.next().unwrap();
        assert_eq!(tar.read_header(), Err(TarError::NullRecord));
    }

    #[test]
    fn entries_are_block_aligned_with_nul_padding() {
        let data = sample_archive();

        // header + padded payload per entry, two null records at the end
        assert_eq!(data.len() % BLOCK_SIZE, 0);
        assert_eq!(data.len(), 4 * BLOCK_SIZE + 2 * BLOCK_SIZE);

        // First payload occupies one block, everything past the content
        // is NUL
        let payload = &data[BLOCK_SIZE..2 * BLOCK_SIZE];
        assert_eq!(&payload[..STR1.len()], STR1);
        assert!(payload[STR1.len()..].iter().all(|&b| b == 0));

        // Terminator is two all zero records
        let tail = &data[data.len() - 2 * BLOCK_SIZE..];
        assert!(tail.iter().all(|&b| b == 0));
    }

    #[test]
    fn partial_data_reads_restore_header_position() {
        let mut tar = Tar::from_buffer(&sample_archive());

        // Consume the first payload in two chunks
        let mut chunk = [0u8; 6];
        tar.read_data(&mut chunk).unwrap();
        assert_eq!(&chunk, b"Hello ");
        let mut rest = [0u8; 5];
        tar.read_data(&mut rest).unwrap();
        assert_eq!(&rest, b"world");

        // Cursor is back on the first header
        assert_eq!(tar.read_header().unwrap().name, "test1.txt");
    }

    #[test]
    fn find_hit_and_miss() {
        let mut tar = Tar::from_buffer(&sample_archive());

        let header = tar.find("test2.txt").unwrap();
        assert_eq!(header.size, STR2.len() as u64);

        // Cursor sits on the found entry, its data is readable directly
        let mut buf = vec![0u8; header.size as usize];
        tar.read_data(&mut buf).unwrap();
        assert_eq!(buf, STR2);

        assert_eq!(tar.find("missing.txt"), Err(TarError::NotFound));
    }

    #[test]
    fn find_rejects_over_long_query() {
        let mut tar = Tar::from_buffer(&sample_archive());
        let name = "n".repeat(NAME_MAX + 1);
        assert_eq!(tar.find(&name), Err(TarError::NameTooLong));
    }

    #[test]
    fn finalize_only_archive_terminates_immediately() {
        let mut tar = Tar::open_memory();
        tar.finalize().unwrap();

        let mut tar = Tar::from_buffer(&tar.into_inner().into_inner());
        assert_eq!(tar.read_header(), Err(TarError::NullRecord));
    }

    #[test]
    fn truncated_archive_is_a_read_failure() {
        // Shorter than one record: not a null record, a medium fault
        let mut tar = Tar::from_buffer(&[0u8; 100]);
        assert_eq!(tar.read_header(), Err(TarError::ReadFailure));
    }

    #[test]
    fn oversized_name_writes_nothing() {
        let mut tar = Tar::open_memory();
        let name = "n".repeat(NAME_MAX + 1);
        assert_eq!(
            tar.write_file_header(&name, 4),
            Err(TarError::NameTooLong)
        );
        assert!(tar.into_inner().is_empty());
    }

    #[test]
    fn dir_entries_have_no_payload() {
        let mut tar = Tar::open_memory();
        tar.write_dir_header("docs").unwrap();
        tar.write_file_header("docs/a.txt", 1).unwrap();
        tar.write_data(b"a").unwrap();
        tar.finalize().unwrap();

        let mut tar = Tar::from_buffer(&tar.into_inner().into_inner());
        let dir = tar.read_header().unwrap();
        assert_eq!(dir.typ, EntryType::Directory);
        assert_eq!(dir.size, 0);
        assert_eq!(dir.mode, 0o775);

        tar.next().unwrap();
        assert_eq!(tar.read_header().unwrap().name, "docs/a.txt");
    }

    #[test]
    fn rewind_resets_mid_payload_state() {
        let mut tar = Tar::from_buffer(&sample_archive());

        let mut chunk = [0u8; 6];
        tar.read_data(&mut chunk).unwrap();
        tar.rewind().unwrap();

        // Mid payload state is gone, iteration starts over
        assert_eq!(tar.read_header().unwrap().name, "test1.txt");
        let mut buf = [0u8; 11];
        tar.read_data(&mut buf).unwrap();
        assert_eq!(&buf, STR1);
    }

    #[test]
    fn chunked_writes_pad_after_final_chunk() {
        let mut tar = Tar::open_memory();
        tar.write_file_header("chunked", 10).unwrap();
        tar.write_data(b"01234").unwrap();
        tar.write_data(b"56789").unwrap();
        tar.finalize().unwrap();

        let data = tar.into_inner().into_inner();
        assert_eq!(data.len(), 2 * BLOCK_SIZE + 2 * BLOCK_SIZE);

        let mut tar = Tar::from_buffer(&data);
        let header = tar.read_header().unwrap();
        let mut buf = vec![0u8; header.size as usize];
        tar.read_data(&mut buf).unwrap();
        assert_eq!(buf, b"0123456789");
    }

    #[test]
    fn multi_block_payload_round_trip() {
        let payload: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();

        let mut tar = Tar::open_memory();
        tar.write_file_header("big.bin", payload.len() as u64).unwrap();
        tar.write_data(&payload).unwrap();
        tar.finalize().unwrap();

        let data = tar.into_inner().into_inner();
        // 2000 bytes round up to four blocks
        assert_eq!(data.len(), BLOCK_SIZE + 4 * BLOCK_SIZE + 2 * BLOCK_SIZE);

        let mut tar = Tar::from_buffer(&data);
        let header = tar.read_header().unwrap();
        let mut buf = vec![0u8; header.size as usize];
        tar.read_data(&mut buf).unwrap();
        assert_eq!(buf, payload);

        tar.next().unwrap();
        assert_eq!(tar.read_header(), Err(TarError::NullRecord));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.tar");

        let mut tar = Tar::open_write(&path).unwrap();
        tar.write_file_header("test1.txt", STR1.len() as u64).unwrap();
        tar.write_data(STR1).unwrap();
        tar.finalize().unwrap();
        tar.close().unwrap();

        let mut tar = Tar::open_read(&path).unwrap();
        let header = tar.read_header().unwrap();
        assert_eq!(header.name, "test1.txt");
        let mut buf = vec![0u8; header.size as usize];
        tar.read_data(&mut buf).unwrap();
        assert_eq!(buf, STR1);

        tar.next().unwrap();
        assert_eq!(tar.read_header(), Err(TarError::NullRecord));
        tar.close().unwrap();
    }

    #[test]
    fn open_read_accepts_empty_finalized_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.tar");

        let mut tar = Tar::open_write(&path).unwrap();
        tar.finalize().unwrap();
        tar.close().unwrap();

        let mut tar = Tar::open_read(&path).unwrap();
        assert_eq!(tar.read_header(), Err(TarError::NullRecord));
    }

    #[test]
    fn open_read_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.tar");

        // A record whose checksum went stale after a name byte flip
        let mut raw = Header::file("x", 0).encode().unwrap();
        raw[0] ^= 0x40;

        let mut back = FileBackend::create(&path).unwrap();
        back.write(&raw).unwrap();
        back.close().unwrap();

        assert_eq!(Tar::open_read(&path).err(), Some(TarError::BadChecksum));
    }

    #[test]
    fn open_read_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.tar");

        let mut back = FileBackend::create(&path).unwrap();
        back.write(&[0u8; 100]).unwrap();
        back.close().unwrap();

        assert_eq!(Tar::open_read(&path).err(), Some(TarError::ReadFailure));
    }
}

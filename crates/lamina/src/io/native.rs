use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, instrument};

use crate::error::ErrorKind;
use crate::{LaminaError, LaminaResult};

use super::file_path::FilePath;
use super::registry::HandleRegistry;
use super::traits::{FileHandle, FileIo, FileStat, StreamHandle};

/* # Why std::fs instead of async I/O?

Reads at this layer are synchronous and blocking by contract: the decoder
above issues a byte-range request and waits for it. std::fs covers that with
no runtime to carry around, and positioned reads (pread/seek_read) give the
offset-addressed path without cursor races.
*/

/// Backend reading real files through the OS.
///
/// All names are resolved as [`FilePath`]s relative to a configured base
/// directory. Files are opened read-shared, so other read-only openers of
/// the same file are not locked out.
#[derive(Debug)]
pub struct NativeFileIo {
    base_dir: PathBuf,
    streams: Mutex<HandleRegistry<File>>,
    files: Mutex<HandleRegistry<File>>,
}

/// Opens an existing file read-only, shared with other readers.
fn open_shared(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        // FILE_SHARE_READ: other read-only openers may coexist.
        options.share_mode(0x0000_0001);
    }
    options.open(path)
}

/// One-call positioned read; the stream cursor is not part of the contract.
#[cfg(unix)]
fn read_at_offset(file: &File, dest: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(dest, offset)
}

#[cfg(windows)]
fn read_at_offset(file: &File, dest: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(dest, offset)
}

#[cfg(not(any(unix, windows)))]
fn read_at_offset(mut file: &File, dest: &mut [u8], offset: u64) -> std::io::Result<usize> {
    // Callers serialize access to the registry slot, so seek-then-read is
    // safe here even though it moves the cursor.
    file.seek(SeekFrom::Start(offset))?;
    file.read(dest)
}

impl NativeFileIo {
    /// Creates a backend resolving all paths against `base_dir`.
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            streams: Mutex::new(HandleRegistry::new()),
            files: Mutex::new(HandleRegistry::new()),
        }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        FilePath::from(name).resolve(&self.base_dir)
    }

    fn io_error(target: impl Into<String>, source: std::io::Error) -> Box<LaminaError> {
        Box::new(LaminaError::new(ErrorKind::Io {
            target: target.into(),
            source,
        }))
    }

    fn invalid_stream(stream: StreamHandle) -> Box<LaminaError> {
        Box::new(LaminaError::new(ErrorKind::InvalidHandle {
            handle: format!("stream {}", stream.raw()),
        }))
    }

    fn invalid_file(file: FileHandle) -> Box<LaminaError> {
        Box::new(LaminaError::new(ErrorKind::InvalidHandle {
            handle: format!("file {}", file.raw()),
        }))
    }
}

impl FileIo for NativeFileIo {
    #[instrument(skip(self))]
    fn open_for_reading(&self, name: &str) -> LaminaResult<StreamHandle> {
        let resolved = self.resolve(name);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = open_shared(&resolved)
            .map_err(|e| Self::io_error(resolved.display().to_string(), e))?;
        let handle = StreamHandle::from_raw(self.streams.lock().unwrap().add(file));
        debug!(handle = handle.raw(), "file opened");
        Ok(handle)
    }

    #[instrument(skip(self))]
    fn open_for_writing(&self, name: &str) -> LaminaResult<StreamHandle> {
        let resolved = self.resolve(name);
        debug!(resolved = %resolved.display(), "creating file for writing");
        let file =
            File::create(&resolved).map_err(|e| Self::io_error(resolved.display().to_string(), e))?;
        let handle = StreamHandle::from_raw(self.streams.lock().unwrap().add(file));
        debug!(handle = handle.raw(), "file created");
        Ok(handle)
    }

    fn read(&self, dest: &mut [u8], stream: StreamHandle) -> LaminaResult<usize> {
        let mut streams = self.streams.lock().unwrap();
        let file = streams
            .get_mut(stream.raw())
            .ok_or_else(|| Self::invalid_stream(stream))?;
        // One read call; a short count signals end-of-data to the caller.
        file.read(dest)
            .map_err(|e| Self::io_error(format!("stream {}", stream.raw()), e))
    }

    fn write(&self, source: &[u8], stream: StreamHandle) -> LaminaResult<()> {
        let mut streams = self.streams.lock().unwrap();
        let file = streams
            .get_mut(stream.raw())
            .ok_or_else(|| Self::invalid_stream(stream))?;
        file.write_all(source)
            .map_err(|e| Self::io_error(format!("stream {}", stream.raw()), e))
    }

    fn file_size(&self, stream: StreamHandle) -> LaminaResult<u64> {
        let streams = self.streams.lock().unwrap();
        let file = streams
            .get(stream.raw())
            .ok_or_else(|| Self::invalid_stream(stream))?;
        let metadata = file
            .metadata()
            .map_err(|e| Self::io_error(format!("stream {}", stream.raw()), e))?;
        Ok(metadata.len())
    }

    fn position(&self, stream: StreamHandle) -> LaminaResult<u64> {
        let mut streams = self.streams.lock().unwrap();
        let file = streams
            .get_mut(stream.raw())
            .ok_or_else(|| Self::invalid_stream(stream))?;
        file.stream_position()
            .map_err(|e| Self::io_error(format!("stream {}", stream.raw()), e))
    }

    fn set_position(&self, stream: StreamHandle, offset: u64) -> LaminaResult<()> {
        let mut streams = self.streams.lock().unwrap();
        let file = streams
            .get_mut(stream.raw())
            .ok_or_else(|| Self::invalid_stream(stream))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| Self::io_error(format!("stream {}", stream.raw()), e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn close(&self, stream: StreamHandle) -> LaminaResult<()> {
        self.streams
            .lock()
            .unwrap()
            .remove(stream.raw())
            .map(drop)
            .ok_or_else(|| Self::invalid_stream(stream))
    }

    #[instrument(skip(self))]
    fn stat(&self, name: &str) -> LaminaResult<FileStat> {
        let resolved = self.resolve(name);
        let metadata = std::fs::metadata(&resolved)
            .map_err(|e| Self::io_error(resolved.display().to_string(), e))?;
        debug!(len = metadata.len(), "stat");
        Ok(FileStat {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }

    #[instrument(skip(self))]
    fn open_for_simultaneous_access(&self, name: &str) -> LaminaResult<FileHandle> {
        let resolved = self.resolve(name);
        debug!(resolved = %resolved.display(), "opening file for shared access");
        let file = open_shared(&resolved)
            .map_err(|e| Self::io_error(resolved.display().to_string(), e))?;
        let handle = FileHandle::from_raw(self.files.lock().unwrap().add(file));
        debug!(handle = handle.raw(), "shared file opened");
        Ok(handle)
    }

    fn read_at(&self, dest: &mut [u8], file: FileHandle, offset: u64) -> LaminaResult<usize> {
        let files = self.files.lock().unwrap();
        let open_file = files
            .get(file.raw())
            .ok_or_else(|| Self::invalid_file(file))?;
        read_at_offset(open_file, dest, offset)
            .map_err(|e| Self::io_error(format!("file {}", file.raw()), e))
    }

    #[instrument(skip(self))]
    fn close_handle(&self, file: FileHandle) -> LaminaResult<()> {
        self.files
            .lock()
            .unwrap()
            .remove(file.raw())
            .map(drop)
            .ok_or_else(|| Self::invalid_file(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with_file(name: &str, content: &[u8]) -> (tempfile::TempDir, NativeFileIo) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(name), content).unwrap();
        let io = NativeFileIo::new(dir.path().to_path_buf());
        (dir, io)
    }

    #[test]
    fn test_open_missing_file_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let io = NativeFileIo::new(dir.path().to_path_buf());

        let err = io.open_for_reading("missing.bin").unwrap_err();
        match err.kind() {
            ErrorKind::Io { target, source } => {
                assert!(target.contains("missing.bin"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("Expected Io, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_read_and_position() {
        let (_dir, io) = backend_with_file("data.bin", b"abcdefgh");
        let stream = io.open_for_reading("data.bin").unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(io.read(&mut buf, stream).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(io.position(stream).unwrap(), 4);

        io.set_position(stream, 6).unwrap();
        assert_eq!(io.read(&mut buf, stream).unwrap(), 2);
        assert_eq!(&buf[..2], b"gh");
    }

    #[test]
    fn test_file_size() {
        let (_dir, io) = backend_with_file("data.bin", b"0123456789");
        let stream = io.open_for_reading("data.bin").unwrap();
        assert_eq!(io.file_size(stream).unwrap(), 10);
    }

    #[test]
    fn test_read_at_does_not_need_cursor() {
        let (_dir, io) = backend_with_file("data.bin", b"abcdefgh");
        let file = io.open_for_simultaneous_access("data.bin").unwrap();

        let mut tail = [0u8; 3];
        assert_eq!(io.read_at(&mut tail, file, 5).unwrap(), 3);
        assert_eq!(&tail, b"fgh");

        let mut head = [0u8; 3];
        assert_eq!(io.read_at(&mut head, file, 0).unwrap(), 3);
        assert_eq!(&head, b"abc");
    }

    #[test]
    fn test_read_at_past_end_is_short() {
        let (_dir, io) = backend_with_file("data.bin", b"abc");
        let file = io.open_for_simultaneous_access("data.bin").unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(io.read_at(&mut buf, file, 2).unwrap(), 1);
        assert_eq!(io.read_at(&mut buf, file, 100).unwrap(), 0);
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let io = NativeFileIo::new(dir.path().to_path_buf());

        let out = io.open_for_writing("out.bin").unwrap();
        io.write(b"written bytes", out).unwrap();
        io.close(out).unwrap();

        let stream = io.open_for_reading("out.bin").unwrap();
        assert_eq!(io.read_to_end(stream).unwrap(), b"written bytes");
    }

    #[test]
    fn test_stat_reports_len() {
        let (_dir, io) = backend_with_file("data.bin", b"abcdef");
        let stat = io.stat("data.bin").unwrap();
        assert_eq!(stat.len, 6);
        assert!(stat.modified.is_some());
    }

    #[test]
    fn test_stat_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let io = NativeFileIo::new(dir.path().to_path_buf());
        assert!(io.stat("missing.bin").is_err());
    }

    #[test]
    fn test_closed_stream_handle_is_invalid() {
        let (_dir, io) = backend_with_file("data.bin", b"abc");
        let stream = io.open_for_reading("data.bin").unwrap();
        io.close(stream).unwrap();

        let mut buf = [0u8; 1];
        let err = io.read(&mut buf, stream).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidHandle { .. }));
        assert!(io.close(stream).is_err());
    }

    #[test]
    fn test_stream_and_file_registries_are_independent() {
        let (_dir, io) = backend_with_file("data.bin", b"abcdefgh");
        let stream = io.open_for_reading("data.bin").unwrap();
        let file = io.open_for_simultaneous_access("data.bin").unwrap();

        // Closing the shared handle leaves the stream readable.
        io.close_handle(file).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(io.read(&mut buf, stream).unwrap(), 2);
    }

    #[test]
    fn test_same_file_opened_by_two_readers() {
        let (_dir, io) = backend_with_file("data.bin", b"abcdefgh");
        let first = io.open_for_simultaneous_access("data.bin").unwrap();
        let second = io.open_for_simultaneous_access("data.bin").unwrap();
        assert_ne!(first, second);

        let mut a = [0u8; 2];
        let mut b = [0u8; 2];
        assert_eq!(io.read_at(&mut a, first, 0).unwrap(), 2);
        assert_eq!(io.read_at(&mut b, second, 6).unwrap(), 2);
        assert_eq!(&a, b"ab");
        assert_eq!(&b, b"gh");
    }
}

use std::io::{Read, Seek};
use std::sync::Arc;
use std::time::SystemTime;

use crate::LaminaResult;

/* # Why is FileIo a trait instead of a struct?

The decoder above this layer must not care whether bytes come from the local
filesystem or from an embedding runtime. A trait at this seam gives:
1. Backend-agnostic callers: the same code drives NativeFileIo and HostFileIo
2. Testability: a recording fake can stand in for either backend

Backends are injected explicitly; there is no process-wide table of
function pointers and no global mutable state.
*/

/// Trait combining Read + Seek for opaque stream objects.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Identifier for sequential, cursor-based read access to one open stream.
///
/// Valid only with the backend that issued it; handles never cross backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(u32);

impl StreamHandle {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Identifier for offset-addressed read access to one open file.
///
/// Unlike [`StreamHandle`], every read names an absolute offset, so the
/// underlying resource can serve multiple readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle(u32);

impl FileHandle {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// File metadata as reported by `FileIo::stat`.
#[derive(Debug, Clone)]
pub struct FileStat {
    /// Size in bytes.
    pub len: u64,
    /// Last modification time, where the backend can report one.
    pub modified: Option<SystemTime>,
}

/// Uniform file-access contract implemented by every backend.
///
/// Two implementations are provided:
/// - `NativeFileIo`: real files through std::fs
/// - `HostFileIo`: delegates to an embedding runtime via [`HostHooks`]
///
/// Short reads are part of the contract: `read` and `read_at` return the
/// count actually read, which may be less than the buffer size; callers
/// must not assume the buffer was filled. Operations a backend cannot
/// provide return `ErrorKind::NotSupported` and leave the backend usable.
///
/// [`HostHooks`]: super::HostHooks
pub trait FileIo: std::fmt::Debug + Send + Sync + 'static {
    /// Opens a stream for cursor-based reading. The native backend treats
    /// `name` as a base-relative path; the host backend parses it as a
    /// decimal host id.
    fn open_for_reading(&self, name: &str) -> LaminaResult<StreamHandle>;

    /// Opens a stream for writing, truncating an existing file.
    fn open_for_writing(&self, name: &str) -> LaminaResult<StreamHandle>;

    /// Reads at the stream cursor into `dest`, returning the short-or-full
    /// count of bytes read. Zero means end of data.
    fn read(&self, dest: &mut [u8], stream: StreamHandle) -> LaminaResult<usize>;

    /// Writes all of `source` at the stream cursor.
    fn write(&self, source: &[u8], stream: StreamHandle) -> LaminaResult<()>;

    /// Total size in bytes of the stream's underlying data.
    fn file_size(&self, stream: StreamHandle) -> LaminaResult<u64>;

    /// Current cursor position.
    fn position(&self, stream: StreamHandle) -> LaminaResult<u64>;

    /// Moves the cursor to an absolute offset.
    fn set_position(&self, stream: StreamHandle, offset: u64) -> LaminaResult<()>;

    /// Closes a stream. On the host backend this releases nothing host-side;
    /// only `close_handle` notifies the host.
    fn close(&self, stream: StreamHandle) -> LaminaResult<()>;

    /// Queries metadata for a file by name, without opening it.
    fn stat(&self, name: &str) -> LaminaResult<FileStat>;

    /// Opens a file for offset-addressed reads, shared across readers.
    fn open_for_simultaneous_access(&self, name: &str) -> LaminaResult<FileHandle>;

    /// Reads from an absolute offset into `dest`, returning the count of
    /// bytes read. Concurrent calls on the same handle must not corrupt
    /// each other's offsets.
    fn read_at(&self, dest: &mut [u8], file: FileHandle, offset: u64) -> LaminaResult<usize>;

    /// Closes a shared file handle, releasing backend resources.
    fn close_handle(&self, file: FileHandle) -> LaminaResult<()>;

    /// Reads a whole stream from its current cursor to the end.
    ///
    /// Convenience with a default implementation; loops on `read` so short
    /// counts from the backend are handled, not masked.
    fn read_to_end(&self, stream: StreamHandle) -> LaminaResult<Vec<u8>> {
        let mut contents = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.read(&mut chunk, stream)?;
            if n == 0 {
                break;
            }
            contents.extend_from_slice(&chunk[..n]);
        }
        Ok(contents)
    }
}

/* # Why Arc<dyn FileIo> behind FileIoHandle?

Arc makes the chosen backend cheaply cloneable and shareable across the
reader pipeline without lifetime parameters; the newtype gives Deref access
and keeps the Arc an implementation detail.
*/

/// Handle to a backend implementation, enabling shared ownership.
#[derive(Debug, Clone)]
pub struct FileIoHandle(Arc<dyn FileIo>);

impl FileIoHandle {
    /// Wraps a backend implementation.
    pub fn new(io: impl FileIo + 'static) -> Self {
        Self(Arc::new(io))
    }
}

impl std::ops::Deref for FileIoHandle {
    type Target = dyn FileIo;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

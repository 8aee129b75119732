use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use crate::error::ErrorKind;
use crate::{LaminaError, LaminaResult};

use super::registry::HandleRegistry;
use super::traits::{FileHandle, FileIo, FileStat, ReadSeek, StreamHandle};

/// Host id assigned by the embedding runtime to one of its open streams.
pub type HostId = u32;

/* # Why a capability trait instead of registered function pointers?

The embedding runtime used to install four process-wide function pointers
at startup, which made initialization order a hidden contract and limited a
process to one host. A trait object passed to the backend constructor keeps
the same four capabilities, scoped to the backend instance that uses them.
*/

/// The I/O capabilities an embedding runtime must provide.
///
/// Each method addresses one host-side stream by its [`HostId`]. A short
/// count from `read_into` signals end-of-data or a partial read and must be
/// forwarded to callers unchanged.
pub trait HostHooks: fmt::Debug + Send + Sync + 'static {
    /// Moves the host stream's cursor to an absolute offset.
    fn set_position(&self, id: HostId, offset: u64) -> LaminaResult<()>;

    /// Reads at the host stream's cursor into `dest`, returning the count
    /// of bytes read.
    fn read_into(&self, id: HostId, dest: &mut [u8]) -> LaminaResult<usize>;

    /// Total size in bytes of the host stream's data.
    fn size(&self, id: HostId) -> LaminaResult<u64>;

    /// Tells the host to release the stream.
    fn close(&self, id: HostId) -> LaminaResult<()>;
}

fn not_supported(operation: &'static str) -> Box<LaminaError> {
    Box::new(LaminaError::new(ErrorKind::NotSupported { operation }))
}

/// Backend that forwards all I/O to an embedding runtime via [`HostHooks`].
///
/// Handles are numerically the host's own ids. `close` on a stream handle
/// is deliberately a no-op host-side; only `close_handle` tells the host to
/// release anything. Write, stat and position queries have no host hook and
/// report `NotSupported`.
#[derive(Debug, Clone)]
pub struct HostFileIo {
    hooks: Arc<dyn HostHooks>,
    // Serializes the set-position + read pair of read_at per host id, so
    // concurrent offset reads on one handle cannot interleave.
    read_locks: Arc<Mutex<HashMap<HostId, Arc<Mutex<()>>>>>,
}

impl HostFileIo {
    /// Creates a backend over a host object.
    pub fn new(hooks: impl HostHooks) -> Self {
        Self::with_hooks(Arc::new(hooks))
    }

    /// Creates a backend over an already-shared host object.
    pub fn with_hooks(hooks: Arc<dyn HostHooks>) -> Self {
        Self {
            hooks,
            read_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Opens a stream for a host id directly, without the decimal-string
    /// round trip of `open_for_reading`.
    pub fn open_id(&self, id: HostId) -> StreamHandle {
        StreamHandle::from_raw(id)
    }

    /// Opens a shared file handle for a host id directly.
    pub fn open_id_for_simultaneous_access(&self, id: HostId) -> FileHandle {
        FileHandle::from_raw(id)
    }

    fn parse_id(name: &str) -> LaminaResult<HostId> {
        name.trim().parse().map_err(|_| {
            Box::new(LaminaError::new(ErrorKind::InvalidHandle {
                handle: name.to_string(),
            }))
        })
    }

    fn read_lock(&self, id: HostId) -> Arc<Mutex<()>> {
        let mut locks = self.read_locks.lock().unwrap();
        Arc::clone(locks.entry(id).or_default())
    }
}

impl FileIo for HostFileIo {
    #[instrument(skip(self))]
    fn open_for_reading(&self, name: &str) -> LaminaResult<StreamHandle> {
        let id = Self::parse_id(name)?;
        debug!(id, "opened host stream");
        Ok(StreamHandle::from_raw(id))
    }

    fn open_for_writing(&self, _name: &str) -> LaminaResult<StreamHandle> {
        Err(not_supported("open_for_writing"))
    }

    fn read(&self, dest: &mut [u8], stream: StreamHandle) -> LaminaResult<usize> {
        self.hooks.read_into(stream.raw(), dest)
    }

    fn write(&self, _source: &[u8], _stream: StreamHandle) -> LaminaResult<()> {
        Err(not_supported("write"))
    }

    fn file_size(&self, stream: StreamHandle) -> LaminaResult<u64> {
        self.hooks.size(stream.raw())
    }

    fn position(&self, _stream: StreamHandle) -> LaminaResult<u64> {
        Err(not_supported("position"))
    }

    fn set_position(&self, stream: StreamHandle, offset: u64) -> LaminaResult<()> {
        self.hooks.set_position(stream.raw(), offset)
    }

    #[instrument(skip(self))]
    fn close(&self, stream: StreamHandle) -> LaminaResult<()> {
        // Intentionally no host notification: the host keeps the id alive
        // until close_handle releases it.
        debug!(id = stream.raw(), "closed host stream locally");
        Ok(())
    }

    fn stat(&self, _name: &str) -> LaminaResult<FileStat> {
        Err(not_supported("stat"))
    }

    #[instrument(skip(self))]
    fn open_for_simultaneous_access(&self, name: &str) -> LaminaResult<FileHandle> {
        let id = Self::parse_id(name)?;
        debug!(id, "opened shared host file");
        Ok(FileHandle::from_raw(id))
    }

    fn read_at(&self, dest: &mut [u8], file: FileHandle, offset: u64) -> LaminaResult<usize> {
        let id = file.raw();
        let lock = self.read_lock(id);
        let _guard = lock.lock().unwrap();
        self.hooks.set_position(id, offset)?;
        self.hooks.read_into(id, dest)
    }

    #[instrument(skip(self))]
    fn close_handle(&self, file: FileHandle) -> LaminaResult<()> {
        let id = file.raw();
        self.read_locks.lock().unwrap().remove(&id);
        debug!(id, "releasing host file");
        self.hooks.close(id)
    }
}

/// One stream registered with a [`ReaderHost`]: the reader plus the declared
/// total length of its data.
struct SizedStream {
    reader: Box<dyn ReadSeek + Send>,
    len: u64,
}

/// In-process [`HostHooks`] implementation backed by registered readers.
///
/// Plays the role of the embedding runtime when there is none: any
/// `Read + Seek` object can be registered together with its byte length and
/// is then addressable through a [`HostFileIo`] by the returned id.
#[derive(Clone, Default)]
pub struct ReaderHost {
    streams: Arc<Mutex<HandleRegistry<SizedStream>>>,
}

impl ReaderHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a reader, returning the id assigned to it.
    ///
    /// `len` is the complete length of the reader's data in bytes, reported
    /// verbatim by `size`.
    pub fn register(&self, reader: impl ReadSeek + Send + 'static, len: u64) -> HostId {
        self.streams.lock().unwrap().add(SizedStream {
            reader: Box::new(reader),
            len,
        })
    }

    /// Registers an in-memory byte buffer.
    pub fn register_bytes(&self, content: Vec<u8>) -> HostId {
        let len = content.len() as u64;
        self.register(std::io::Cursor::new(content), len)
    }

    /// Number of currently registered streams.
    pub fn stream_count(&self) -> usize {
        self.streams.lock().unwrap().len()
    }

    fn invalid(id: HostId) -> Box<LaminaError> {
        Box::new(LaminaError::new(ErrorKind::InvalidHandle {
            handle: id.to_string(),
        }))
    }
}

impl fmt::Debug for ReaderHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderHost")
            .field("streams", &self.stream_count())
            .finish()
    }
}

impl HostHooks for ReaderHost {
    fn set_position(&self, id: HostId, offset: u64) -> LaminaResult<()> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams.get_mut(id).ok_or_else(|| Self::invalid(id))?;
        stream.reader.seek(SeekFrom::Start(offset)).map_err(|e| {
            Box::new(LaminaError::new(ErrorKind::Io {
                target: format!("host stream {}", id),
                source: e,
            }))
        })?;
        Ok(())
    }

    fn read_into(&self, id: HostId, dest: &mut [u8]) -> LaminaResult<usize> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams.get_mut(id).ok_or_else(|| Self::invalid(id))?;
        // A single read call: short counts are the caller's signal for
        // end-of-data and must not be papered over with retries.
        stream.reader.read(dest).map_err(|e| {
            Box::new(LaminaError::new(ErrorKind::Io {
                target: format!("host stream {}", id),
                source: e,
            }))
        })
    }

    fn size(&self, id: HostId) -> LaminaResult<u64> {
        let streams = self.streams.lock().unwrap();
        let stream = streams.get(id).ok_or_else(|| Self::invalid(id))?;
        Ok(stream.len)
    }

    fn close(&self, id: HostId) -> LaminaResult<()> {
        self.streams
            .lock()
            .unwrap()
            .remove(id)
            .map(drop)
            .ok_or_else(|| Self::invalid(id))
    }
}

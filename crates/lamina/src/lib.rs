/* # Why have lamina as one core library?

lamina is the platform I/O layer an embeddable slide reader builds on: the
error taxonomy, tracing setup, and the dual-backend file-access abstraction
live together so every consumer shares one error type and one contract.
*/

pub mod error;
pub mod io;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{LaminaError, LaminaResult, ResultExt};
pub use io::{
    FileHandle, FileIo, FileIoHandle, FilePath, FileStat, HostFileIo, HostHooks, HostId,
    NativeFileIo, ReadSeek, ReaderHost, StreamHandle,
};
pub use crate::tracing::init_tracing;

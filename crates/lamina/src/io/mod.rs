/* # The file-access layer

A uniform contract over byte-range file access with two backends: real files
through the OS (NativeFileIo) and delegation to an embedding runtime
(HostFileIo via the HostHooks capability trait). The decoder above this
layer is backend-agnostic; it sees only the FileIo trait and opaque handles.
*/

mod file_path;
pub mod host;
pub mod native;
pub mod registry;
pub mod text;
mod traits;

pub use file_path::FilePath;
pub use host::{HostFileIo, HostHooks, HostId, ReaderHost};
pub use native::NativeFileIo;
pub use registry::HandleRegistry;
pub use traits::{FileHandle, FileIo, FileIoHandle, FileStat, ReadSeek, StreamHandle};

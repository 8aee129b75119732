use std::error::Error as StdError;
use std::fmt;

use tracing_error::SpanTrace;

/* # Why a custom error type and not anyhow/eyre/thiserror?

- Better control over error handling
- Fewer dependencies to compile and integrate
- Callers can pattern match on ErrorKind to decide whether a failure is
  recoverable (e.g. NotSupported vs. a real I/O failure)
*/

/// Error variants that can occur in lamina operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// An underlying I/O operation failed. `target` names the file or host
    /// stream the operation was addressed to.
    Io {
        target: String,
        source: std::io::Error,
    },

    /// The backend does not implement this operation. Recoverable: the
    /// backend stays fully usable after reporting it.
    NotSupported { operation: &'static str },

    /// Wide/narrow string conversion failed.
    Encoding { detail: String },

    /// A handle or id was not produced by this backend, was already closed,
    /// or could not be parsed.
    InvalidHandle { handle: String },

    /// Catch-all for other errors with a message.
    Message { message: String },
}

/* # Why separate ErrorKind and LaminaError?
ErrorKind holds the structural variant; LaminaError wraps it with a context
stack for propagation and a span trace captured at construction. Users match
on kind(), callers attach context while bubbling up.
*/

/// Error type wrapping ErrorKind with a context stack and a captured span trace.
pub struct LaminaError {
    kind: ErrorKind,
    context: Vec<String>,
    span_trace: SpanTrace,
}

impl LaminaError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a message-only error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    /// Allows pattern matching on specific error variants.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the span trace captured when the error was constructed.
    /// Requires an active subscriber with an ErrorLayer to be non-empty.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }
}

impl fmt::Debug for LaminaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaminaError")
            .field("kind", &self.kind)
            .field("context", &self.context)
            .finish()
    }
}

impl From<ErrorKind> for LaminaError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<ErrorKind> for Box<LaminaError> {
    fn from(kind: ErrorKind) -> Self {
        Box::new(LaminaError::new(kind))
    }
}

impl StdError for LaminaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::Io { source, .. } => Some(source),
            ErrorKind::NotSupported { .. }
            | ErrorKind::Encoding { .. }
            | ErrorKind::InvalidHandle { .. }
            | ErrorKind::Message { .. } => None,
        }
    }
}

impl fmt::Display for LaminaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display context first if present
        for (i, ctx) in self.context.iter().enumerate() {
            if i == 0 {
                write!(f, "{}", ctx)?;
            } else {
                write!(f, ": {}", ctx)?;
            }
        }
        if !self.context.is_empty() {
            write!(f, ": ")?;
        }

        match &self.kind {
            ErrorKind::Io { target, source } => {
                write!(f, "I/O error on {}: {}", target, source)
            }
            ErrorKind::NotSupported { operation } => {
                write!(f, "Operation not supported by this backend: {}", operation)
            }
            ErrorKind::Encoding { detail } => {
                write!(f, "String conversion failed: {}", detail)
            }
            ErrorKind::InvalidHandle { handle } => {
                write!(f, "Invalid handle: {}", handle)
            }
            ErrorKind::Message { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

/* # Why Box<LaminaError> in the result type?

Boxing keeps the Ok path small; the error path is cold and can afford the
allocation.
*/

/// Standard result type for lamina operations.
pub type LaminaResult<T> = std::result::Result<T, Box<LaminaError>>;

/// Creates a boxed message error from format arguments.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::error::LaminaError::message(format!($($arg)*)))
    };
}

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> LaminaResult<T>;

    /// Attaches context using lazy evaluation.
    /// Prefer this to avoid string formatting in the success path.
    fn with_context<F>(self, f: F) -> LaminaResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for LaminaResult<T> {
    fn context(self, context: impl Into<String>) -> LaminaResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> LaminaResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_from_io_kind() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let kind = ErrorKind::Io {
            target: "slides/a.isyntax".to_string(),
            source: io_err,
        };
        let error = LaminaError::new(kind);

        match error.kind() {
            ErrorKind::Io { target, .. } => {
                assert_eq!(target, "slides/a.isyntax");
            }
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_error_not_supported_display() {
        let error = LaminaError::new(ErrorKind::NotSupported {
            operation: "open_for_writing",
        });
        assert_eq!(
            error.to_string(),
            "Operation not supported by this backend: open_for_writing"
        );
    }

    #[test]
    fn test_error_invalid_handle_display() {
        let error = LaminaError::new(ErrorKind::InvalidHandle {
            handle: "banana".to_string(),
        });
        assert_eq!(error.to_string(), "Invalid handle: banana");
    }

    #[test]
    fn test_error_context_attachment() {
        let error = LaminaError::message("original error")
            .context("first context")
            .context("second context");

        assert_eq!(error.context.len(), 2);
        assert_eq!(
            error.to_string(),
            "first context: second context: original error"
        );
    }

    #[test]
    fn test_error_with_context_lazy_evaluation() {
        let mut called = false;
        let error = LaminaError::message("error").with_context(|| {
            called = true;
            "lazy context".to_string()
        });

        assert!(called);
        assert_eq!(error.context[0], "lazy context");
    }

    #[test]
    fn test_error_source_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error = LaminaError::new(ErrorKind::Io {
            target: "test.bin".to_string(),
            source: io_err,
        });
        assert!(error.source().is_some());
    }

    #[test]
    fn test_error_source_not_supported() {
        let error = LaminaError::new(ErrorKind::NotSupported { operation: "stat" });
        assert!(error.source().is_none());
    }

    #[test]
    fn test_error_root_cause_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let error = LaminaError::new(ErrorKind::Io {
            target: "test.bin".to_string(),
            source: io_err,
        });
        assert_eq!(error.root_cause().to_string(), "not found");
    }

    #[test]
    fn test_error_preserves_os_code() {
        let io_err = io::Error::from_raw_os_error(2);
        let error = LaminaError::new(ErrorKind::Io {
            target: "missing.bin".to_string(),
            source: io_err,
        });
        match error.kind() {
            ErrorKind::Io { source, .. } => {
                assert_eq!(source.raw_os_error(), Some(2));
            }
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_result_ext_context_success() {
        let result: LaminaResult<i32> = Ok(42);
        let final_result = result.context("operation failed");
        assert_eq!(final_result.unwrap(), 42);
    }

    #[test]
    fn test_result_ext_context_error() {
        let result: LaminaResult<i32> = Err(Box::new(LaminaError::message("original")));
        let err = result.context("operation failed").unwrap_err();
        assert_eq!(err.to_string(), "operation failed: original");
    }

    #[test]
    fn test_result_ext_chaining() {
        let result: LaminaResult<i32> = Err(Box::new(LaminaError::message("root")));
        let err = result
            .context("step 1")
            .context("step 2")
            .with_context(|| "step 3".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "step 1: step 2: step 3: root");
    }

    #[test]
    fn test_err_macro() {
        let error = err!("stream {} vanished", 7);
        match error.kind() {
            ErrorKind::Message { message } => {
                assert_eq!(message, "stream 7 vanished");
            }
            _ => panic!("Expected Message variant"),
        }
    }
}

use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::{LaminaError, LaminaResult};

/* # Conversion failures are errors, not empty strings

The old layer answered a failed conversion with a diagnostic print and an
empty result, which callers could not distinguish from converting "".
Here every failure is a typed Encoding error.
*/

/// Converts a UTF-8 byte sequence to the native wide-character encoding
/// (UTF-16 code units).
pub fn widen(bytes: &[u8]) -> LaminaResult<Vec<u16>> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        Box::new(LaminaError::new(ErrorKind::Encoding {
            detail: format!("input is not valid UTF-8: {}", e),
        }))
    })?;
    Ok(text.encode_utf16().collect())
}

/// Converts a wide-character (UTF-16) sequence back to a UTF-8 string.
/// Unpaired surrogates are reported, not replaced.
pub fn narrow(wide: &[u16]) -> LaminaResult<String> {
    String::from_utf16(wide).map_err(|_| {
        Box::new(LaminaError::new(ErrorKind::Encoding {
            detail: "wide string contains an unpaired surrogate".to_string(),
        }))
    })
}

/// Logs the OS's last-error state with a caller-supplied prefix.
/// Observational only; control flow is unaffected.
pub fn log_last_os_error(prefix: &str) {
    let error = std::io::Error::last_os_error();
    warn!(code = error.raw_os_error(), "{}: {}", prefix, error);
}

/// Verbose variant of [`log_last_os_error`], emitted at debug level.
pub fn log_last_os_error_verbose(prefix: &str) {
    let error = std::io::Error::last_os_error();
    debug!(code = error.raw_os_error(), "{}: {}", prefix, error);
}

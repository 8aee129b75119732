use crate::LaminaResult;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use tracing::instrument;
pub use tracing::{debug, error, info, trace, warn};

/// Installs the global subscriber: formatted output plus an ErrorLayer so
/// errors can capture span traces. Call once, early.
pub fn init_tracing() -> LaminaResult<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

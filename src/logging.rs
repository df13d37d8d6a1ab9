//! Tracing subscriber bootstrap for binaries and tests.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Error, Result};

/// Installs a global fmt subscriber honoring the given filter directive
/// (e.g. `"espejo=debug"`). Library code only emits events; calling
/// this is the host application's choice.
pub fn init(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| Error::InvalidArgument(format!("invalid log filter: {e}")))?,
        )
        .with_target(true)
        .try_init()
        .map_err(|_| Error::InvalidArgument("logging already initialized".into()))
}

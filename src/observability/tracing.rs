use anyhow::{Error, Result};
use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Initialize the global tracing subscriber exactly once.
///
/// Format is controlled by `LOG_FORMAT` (`json` by default, `pretty` for local
/// development); verbosity by the standard `RUST_LOG` filter.
///
/// # Errors
/// Returns an error if the subscriber has already been set by another crate.
pub fn init() -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let pretty = std::env::var("LOG_FORMAT").as_deref() == Ok("pretty");

        let registry = tracing_subscriber::registry().with(env_filter);
        if pretty {
            registry
                .with(tracing_subscriber::fmt::layer().with_target(false))
                .try_init()
                .map_err(|error| Error::msg(error.to_string()))?;
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_target(false).json())
                .try_init()
                .map_err(|error| Error::msg(error.to_string()))?;
        }

        info!("tracing initialized");
        Ok::<(), Error>(())
    })?;
    Ok(())
}

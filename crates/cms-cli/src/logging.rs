//! Subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// The filter comes from `RUST_LOG`, falling back to `default_directive`.
pub fn init(default_directive: &str, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().try_init().map_err(|err| anyhow::anyhow!(err))
    } else {
        builder.try_init().map_err(|err| anyhow::anyhow!(err))
    }
}

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber on stderr. `RUST_LOG` takes
/// precedence over `default_filter`.
pub fn init(default_filter: &str) -> crate::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| {
            crate::Error::LogFilterInvalid(default_filter.to_string(), e.to_string())
        })?,
    };

    // A subscriber may already be installed (tests, embedding apps).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    Ok(())
}

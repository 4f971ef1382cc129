use tracing_subscriber::{EnvFilter, filter::LevelFilter, prelude::*};

/// Installs the stderr log formatter, filtered by `RUST_LOG` (default `info`).
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .try_init()?;

    Ok(())
}

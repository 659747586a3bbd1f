use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` directives are applied on
/// top of the defaults.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("etl_worker=debug".parse()?)
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

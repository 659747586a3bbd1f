use std::sync::Arc;
use clap::Parser;
use etl_worker::{
    application::context::ContextFactory,
    cli::PollerArgs,
    config::ConfigResolver,
    infrastructure::{aws, mysql::MySqlConnector, s3_adapter::S3ObjectStore, sqs_adapter::SqsQueue},
    queue_pump::{PumpSettings, QueuePump},
};
use tracing::{debug, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    etl_worker::telemetry::init()?;
    info!("Starting queue poller");

    let args = PollerArgs::parse();
    let overrides = args.to_overrides();
    let resolver = ConfigResolver::new(&args.const_path);

    // Clients are built once from the startup view of the configuration
    // and shared by every per-message context.
    let startup = resolver.resolve(&overrides);
    debug!("Resolved {} configuration keys", startup.len());
    let settings = PumpSettings::from_config(&startup)?;

    let sdk_config = aws::load_sdk_config(startup.text("region").as_deref()).await;
    let s3 = aws::s3_client(&sdk_config, startup.text("s3_endpoint").as_deref());
    let sqs = aws::sqs_client(&sdk_config, startup.text("sqs_endpoint").as_deref());
    debug!("AWS clients initialized");

    let contexts = ContextFactory::new(
        resolver,
        overrides,
        Arc::new(S3ObjectStore::new(s3)),
        Arc::new(MySqlConnector),
    );

    QueuePump::new(SqsQueue::new(sqs), contexts, settings).run().await;
    Ok(())
}

use std::sync::Arc;
use aws_lambda_events::event::sqs::SqsEvent;
use etl_worker::{
    application::context::ContextFactory,
    config::{ConfigLayer, ConfigResolver},
    infrastructure::{aws, mysql::MySqlConnector, s3_adapter::S3ObjectStore},
    trigger_adapter::TriggerAdapter,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;

const DEFAULT_CONST_PATH: &str = "./const.yml";

#[tokio::main]
async fn main() -> Result<(), Error> {
    etl_worker::telemetry::init()?;
    info!("Initiating managed trigger handler");

    let const_path = std::env::var("CONST_PATH").unwrap_or_else(|_| DEFAULT_CONST_PATH.to_string());
    let resolver = ConfigResolver::new(const_path);
    let startup = resolver.resolve(&ConfigLayer::new());

    let sdk_config = aws::load_sdk_config(startup.text("region").as_deref()).await;
    let s3 = aws::s3_client(&sdk_config, startup.text("s3_endpoint").as_deref());

    let adapter = Arc::new(TriggerAdapter::new(ContextFactory::new(
        resolver,
        ConfigLayer::new(),
        Arc::new(S3ObjectStore::new(s3)),
        Arc::new(MySqlConnector),
    )));

    run(service_fn(move |event: LambdaEvent<SqsEvent>| {
        let adapter = Arc::clone(&adapter);
        async move { adapter.handle(event.payload).await.map_err(Error::from) }
    }))
    .await
}

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::{debug, info};

pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    debug!("Loading AWS configuration");
    let mut builder = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        builder = builder.region(Region::new(region.to_string()));
    }
    let sdk_config = builder.load().await;
    debug!("AWS region: {:?}", sdk_config.region());
    sdk_config
}

/// Path-style addressing is enabled whenever the endpoint is overridden,
/// which is what S3-compatible local stacks expect.
pub fn s3_client(sdk_config: &SdkConfig, endpoint: Option<&str>) -> aws_sdk_s3::Client {
    let mut s3_config = aws_sdk_s3::config::Builder::from(sdk_config);
    if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
        info!("Using custom S3 endpoint: {}", endpoint);
        s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
    }
    aws_sdk_s3::Client::from_conf(s3_config.build())
}

pub fn sqs_client(sdk_config: &SdkConfig, endpoint: Option<&str>) -> aws_sdk_sqs::Client {
    let mut sqs_config = aws_sdk_sqs::config::Builder::from(sdk_config);
    if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
        info!("Using custom SQS endpoint: {}", endpoint);
        sqs_config = sqs_config.endpoint_url(endpoint);
    }
    aws_sdk_sqs::Client::from_conf(sqs_config.build())
}

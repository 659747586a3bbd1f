use std::path::PathBuf;
use clap::Parser;
use crate::config::{ConfigLayer, ConfigValue};

/// Flags for the self-hosted poller. Long names match configuration keys.
#[derive(Debug, Clone, Parser)]
#[command(name = "etl_worker", about = "Polls a queue and bulk-loads delimited blobs into MySQL")]
#[command(rename_all = "snake_case")]
pub struct PollerArgs {
    #[arg(long, env = "READ_QUEUE")]
    pub read_queue: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub poll_batch_size: i32,

    /// Seconds to sleep between poll cycles.
    #[arg(long, default_value_t = 15)]
    pub poll_interval: u32,

    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = "us-east-1")]
    pub region: String,

    #[arg(long, default_value = "./const.yml")]
    pub const_path: PathBuf,

    #[arg(long, env = "S3_ENDPOINT", default_value = "http://localhost:4572")]
    pub s3_endpoint: String,

    #[arg(long, env = "SQS_ENDPOINT", default_value = "http://localhost:4576")]
    pub sqs_endpoint: String,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 3306)]
    pub db_port: u16,

    #[arg(long, env = "DB_NAME", default_value = "activity")]
    pub db_name: String,

    #[arg(long, env = "DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(long, env = "DB_PASS", default_value = "password", hide_env_values = true)]
    pub db_pass: String,

    #[arg(long)]
    pub newline: Option<String>,

    #[arg(long)]
    pub delimiter: Option<String>,

    #[arg(long)]
    pub insert_statement: Option<String>,
}

impl PollerArgs {
    /// The override layer. Optional flags left unset are dropped so they
    /// never mask values from the file or the environment; flags with a
    /// default are always present.
    pub fn to_overrides(&self) -> ConfigLayer {
        let entries: [(&str, Option<ConfigValue>); 15] = [
            ("read_queue", self.read_queue.clone().map(ConfigValue::Text)),
            ("poll_batch_size", Some(ConfigValue::Integer(i64::from(self.poll_batch_size)))),
            ("poll_interval", Some(ConfigValue::Integer(i64::from(self.poll_interval)))),
            ("region", Some(self.region.as_str().into())),
            ("const_path", Some(ConfigValue::Text(self.const_path.display().to_string()))),
            ("s3_endpoint", Some(self.s3_endpoint.as_str().into())),
            ("sqs_endpoint", Some(self.sqs_endpoint.as_str().into())),
            ("db_host", Some(self.db_host.as_str().into())),
            ("db_port", Some(ConfigValue::Integer(i64::from(self.db_port)))),
            ("db_name", Some(self.db_name.as_str().into())),
            ("db_user", Some(self.db_user.as_str().into())),
            ("db_pass", Some(self.db_pass.as_str().into())),
            ("newline", self.newline.clone().map(ConfigValue::Text)),
            ("delimiter", self.delimiter.clone().map(ConfigValue::Text)),
            ("insert_statement", self.insert_statement.clone().map(ConfigValue::Text)),
        ];

        entries
            .into_iter()
            .filter_map(|(key, value)| Some((key.to_string(), value?)))
            .collect()
    }
}

pub mod aws;
pub mod mysql;
pub mod parsers;
pub mod s3_adapter;
pub mod sqs_adapter;

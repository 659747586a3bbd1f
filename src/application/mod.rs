pub mod context;
pub mod record_processor;

use tracing::{debug, error, info};
use crate::{
    application::context::ProcessingContext,
    domain::{error::ProcessingError, models::WorkDescriptor},
    infrastructure::parsers::delimited::split_records,
};

/// Decodes a work message body. Only `bucket` and `key` are read.
pub fn parse_work_message(message: &str) -> Result<WorkDescriptor, ProcessingError> {
    serde_json::from_str(message).map_err(|e| {
        error!("Failed to parse work message: {}", e);
        ProcessingError::InvalidInput(e.to_string())
    })
}

/// Loads the blob named by `message` into the database.
///
/// Expects `context` to already hold an open connection. Returns `true`
/// once the whole batch has been committed; callers treat that as the
/// signal to acknowledge the message.
pub async fn run<C>(message: &str, context: &mut C) -> Result<bool, ProcessingError>
where
    C: ProcessingContext + ?Sized,
{
    // Step 1: Decode the work descriptor
    let work = parse_work_message(message)?;
    info!("Starting download: s3://{}/{}", work.bucket, work.key);

    // Step 2: Fetch the blob
    let store = context.object_store();
    let raw = store
        .get_object(&work.bucket, &work.key)
        .await
        .map_err(|source| {
            error!("Failed to fetch s3://{}/{}: {}", work.bucket, work.key, source);
            ProcessingError::FetchFailed {
                bucket: work.bucket.clone(),
                key: work.key.clone(),
                source,
            }
        })?;
    info!("Fetched {} bytes", raw.len());

    // Step 3: Decode and split into records
    let text = String::from_utf8(raw).map_err(|e| {
        error!("Blob s3://{}/{} is not valid UTF-8: {}", work.bucket, work.key, e);
        ProcessingError::InvalidInput(format!(
            "s3://{}/{} is not valid UTF-8: {}",
            work.bucket, work.key, e
        ))
    })?;
    let config = context.config();
    let newline = config.require_token("newline")?;
    let delimiter = config.require_token("delimiter")?;
    let insert_statement = config.require_text("insert_statement")?;
    let batch = split_records(&text, &newline, &delimiter);
    debug!("Insert statement: {}", insert_statement);
    info!("Insert records: {}", batch.len());

    // Step 4: Write the batch in one transaction
    let connection = context.connection()?;
    let rows_affected = connection
        .execute_many(&insert_statement, &batch)
        .await
        .map_err(|e| {
            error!("Failed to insert {} records: {}", batch.len(), e);
            ProcessingError::InsertFailed(e)
        })?;

    info!(
        "✅ Loaded s3://{}/{} - {} records, {} rows affected",
        work.bucket, work.key, batch.len(), rows_affected
    );
    Ok(true)
}

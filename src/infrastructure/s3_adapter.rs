use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::{debug, error};
use crate::domain::{error::StoreError, ports::ObjectStore};

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        debug!("Requesting s3://{}/{}", bucket, key);

        let response = self.client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) {
                    return StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    };
                }
                error!("S3 get_object failed for s3://{}/{}: {:?}", bucket, key, e);
                StoreError::Backend(e.to_string())
            })?;

        let body = response.body
            .collect()
            .await
            .map_err(|e| {
                error!("Failed to read body of s3://{}/{}: {}", bucket, key, e);
                StoreError::Backend(e.to_string())
            })?;

        Ok(body.into_bytes().to_vec())
    }
}

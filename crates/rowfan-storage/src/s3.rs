//! S3 implementation of [`StorageBackend`].
//!
//! A thin adapter over the AWS SDK client; authentication comes from the
//! standard AWS config chain and is not handled here. S3's `Range` header
//! is end-inclusive, so the caller's half-open `[start, end)` is converted
//! by subtracting 1 from the end offset.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::backend::{PutAck, StorageBackend};
use crate::error::{self, StorageError};

/// S3-backed blob storage.
///
/// Create with [`S3Storage::from_env`] using the ambient AWS config chain,
/// or [`S3Storage::new`] with a pre-built client.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Wrap a pre-built S3 client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS config chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }

    /// Render the end-inclusive S3 `Range` header for `[start, end)`.
    fn range_header(start: u64, end: u64) -> String {
        format!("bytes={start}-{}", end - 1)
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn put(&self, bucket: &str, key: &str, data: &[u8]) -> error::Result<PutAck> {
        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|err| StorageError::backend(err.into_service_error()))?;

        tracing::debug!(bucket, key, bytes = data.len(), "Staged object");
        Ok(PutAck {
            bytes: data.len() as u64,
            etag: output.e_tag().map(str::to_string),
        })
    }

    async fn get_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end: u64,
    ) -> error::Result<Vec<u8>> {
        if start > end {
            return Err(StorageError::InvalidRange { start, end });
        }
        if start == end {
            // S3 cannot express an empty inclusive range.
            return Ok(Vec::new());
        }

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .range(Self::range_header(start, end))
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StorageError::backend(service_err)
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(StorageError::backend)?
            .to_vec();

        // S3 truncates a range that runs past the object instead of erroring.
        let expected = end - start;
        if bytes.len() as u64 != expected {
            return Err(StorageError::OutOfBounds {
                start,
                end,
                len: start + bytes.len() as u64,
            });
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_header_is_end_inclusive() {
        assert_eq!(S3Storage::range_header(0, 10), "bytes=0-9");
        assert_eq!(S3Storage::range_header(128, 129), "bytes=128-128");
    }
}

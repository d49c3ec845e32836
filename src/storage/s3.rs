use async_trait::async_trait;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{ObjectStore, StoredObject};
use crate::error::StorageError;

/// Connection settings for the S3 client.
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    /// AWS region
    pub region: String,

    /// Custom endpoint for S3-compatible services (MinIO, etc.)
    pub endpoint: Option<String>,

    /// Static access key id; `None` uses the default credential chain
    pub access_key_id: Option<String>,

    /// Static secret access key, paired with `access_key_id`
    pub secret_access_key: Option<String>,
}

/// S3-backed implementation of [`ObjectStore`].
///
/// Keys map one-to-one onto object keys in a single bucket.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a store over `bucket` using an already configured client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let is_not_found = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);

                // Some S3-compatible services answer a bare 404 without the
                // NoSuchKey code
                let status_is_404 = e
                    .raw_response()
                    .map(|r| r.status().as_u16() == 404)
                    .unwrap_or(false);

                if is_not_found || status_is_404 {
                    return StorageError::NotFound(self.object_url(key));
                }

                classify_sdk_error(&e, StorageError::Read)
            })?;

        let content_type = output.content_type().map(str::to_string);

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Body(e.to_string()))?
            .into_bytes();

        Ok(StoredObject { content_type, body })
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        let content_length = body.len() as i64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, StorageError::Write))?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

/// Split SDK failures into "could not talk to S3 at all" and "S3 said no".
fn classify_sdk_error<E, R>(
    err: &SdkError<E, R>,
    rejected: fn(String) -> StorageError,
) -> StorageError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::ConstructionFailure(_)
        | SdkError::DispatchFailure(_)
        | SdkError::TimeoutError(_) => StorageError::Session(err.to_string()),
        _ => rejected(err.to_string()),
    }
}

/// Create an S3 client with optional custom endpoint and static credentials.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let settings = S3Settings {
///     region: "us-east-1".to_string(),
///     endpoint: Some("http://localhost:9000".to_string()),
///     ..Default::default()
/// };
/// let client = create_s3_client(&settings).await;
/// ```
pub async fn create_s3_client(settings: &S3Settings) -> Client {
    let region = aws_config::Region::new(settings.region.clone());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(ref endpoint) = settings.endpoint {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&settings.access_key_id, &settings.secret_access_key)
    {
        config_loader = config_loader.credentials_provider(Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "thumb-streamer-static",
        ));
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services usually need path-style addressing
    let s3_config = if settings.endpoint.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}

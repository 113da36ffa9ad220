use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Bodies up to this size go out as a single conditional PUT; larger ones are
/// sent as a multipart upload with parts of this size.
pub const PART_SIZE: usize = 8 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object already exists")]
    PreconditionFailed,

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store error: {0}")]
    Backend(#[from] anyhow::Error),
}

fn backend<E>(err: E) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StorageError::Backend(anyhow::Error::new(err))
}

/// Attributes of one stored object as reported by a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAttrs {
    pub key: String,
    pub size: i64,
    pub content_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub owner: Option<String>,
}

pub struct ObjectData {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Flat key/value blob storage holding the drive.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    /// All objects whose key starts with `prefix`, in key order.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectAttrs>, StorageError>;

    /// Writes `reader` to `key` only if nothing is stored there yet.
    /// Returns the number of bytes written.
    async fn put_if_absent<'a>(
        &self,
        key: &str,
        content_type: Option<&str>,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<u64, StorageError>;

    async fn get_object(&self, key: &str) -> Result<ObjectData, StorageError>;

    /// Declared content type of one object, `None` when the object is gone or
    /// was stored without one.
    async fn content_type(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<(), StorageError>;
}

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    async fn upload_parts<'a>(
        &self,
        key: &str,
        upload_id: &str,
        reader: &mut Box<dyn AsyncRead + Unpin + Send + 'a>,
        mut buffer: Vec<u8>,
        first_len: usize,
    ) -> Result<u64, StorageError> {
        let mut part_number = 1;
        let mut completed_parts = Vec::new();
        let mut total_size = 0u64;
        let mut n = first_len;

        while n > 0 {
            total_size += n as u64;
            let upload_part_res = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .body(ByteStream::from(buffer[..n].to_vec()))
                .part_number(part_number)
                .send()
                .await
                .map_err(backend)?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(upload_part_res.e_tag().unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );

            part_number += 1;
            n = fill_buffer(reader, &mut buffer).await?;
        }

        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .if_none_match("*")
            .multipart_upload(completed_multipart_upload)
            .send()
            .await
            .map_err(map_write_error)?;

        Ok(total_size)
    }
}

/// Reads until `buffer` is full or the stream ends.
async fn fill_buffer<R>(reader: &mut R, buffer: &mut [u8]) -> Result<usize, StorageError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut n = 0;
    while n < buffer.len() {
        let read = reader.read(&mut buffer[n..]).await?;
        if read == 0 {
            break;
        }
        n += read;
    }
    Ok(n)
}

/// `If-None-Match: *` rejections come back as 412 / `PreconditionFailed`.
fn map_write_error<E>(err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.as_service_error().and_then(|e| e.code());
    if status == Some(412) || code == Some("PreconditionFailed") {
        StorageError::PreconditionFailed
    } else {
        backend(err)
    }
}

fn to_chrono(d: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(d.secs(), d.subsec_nanos())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectAttrs>, StorageError> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .fetch_owner(true)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(
                        "S3 list_objects_v2 failed: bucket={}, prefix={:?}, error={:?}",
                        self.bucket,
                        prefix,
                        e
                    );
                    backend(e)
                })?;

            for object in res.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                objects.push(ObjectAttrs {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0),
                    // not reported by ListObjectsV2, see `content_type`
                    content_type: None,
                    created_at: object.last_modified().and_then(to_chrono),
                    owner: object
                        .owner()
                        .and_then(|o| o.display_name().or(o.id()))
                        .map(str::to_string),
                });
            }

            if res.is_truncated().unwrap_or(false) {
                continuation_token = res.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn put_if_absent<'a>(
        &self,
        key: &str,
        content_type: Option<&str>,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<u64, StorageError> {
        let mut buffer = vec![0u8; PART_SIZE];
        let first_len = fill_buffer(&mut reader, &mut buffer).await?;

        if first_len < PART_SIZE {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .if_none_match("*")
                .set_content_type(content_type.map(str::to_string))
                .body(ByteStream::from(buffer[..first_len].to_vec()))
                .send()
                .await
                .map_err(map_write_error)?;
            return Ok(first_len as u64);
        }

        let multipart_upload_res = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(backend)?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| anyhow::anyhow!("No upload ID"))?
            .to_string();

        match self
            .upload_parts(key, &upload_id, &mut reader, buffer, first_len)
            .await
        {
            Ok(size) => Ok(size),
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!(
                        "S3 abort_multipart_upload failed: key={}, error={:?}",
                        key,
                        abort_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn get_object(&self, key: &str) -> Result<ObjectData, StorageError> {
        let res = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Err(StorageError::NotFound(key.to_string()));
                }
                return Err(backend(service_error));
            }
        };

        let content_type = res.content_type().map(str::to_string);
        let bytes = res.body.collect().await.map_err(backend)?.to_vec();
        Ok(ObjectData {
            content_type,
            bytes,
        })
    }

    async fn content_type(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(res) => Ok(res.content_type().map(str::to_string)),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    return Ok(None);
                }
                Err(backend(service_error))
            }
        }
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(backend)?;
        Ok(())
    }
}

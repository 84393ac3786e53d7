#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Evidence blob storage for crime reports.
//!
//! Reports never persist raw attachment data, only URLs into an opaque
//! blob store. This crate provides the [`BlobStore`] capability trait,
//! an S3-compatible implementation ([`S3BlobStore`]), an in-memory
//! implementation for local development and tests
//! ([`MemoryBlobStore`]), and the attachment ingestion pass that
//! normalizes mixed attachment sources into persisted URLs with
//! compensating rollback (see [`ingest`]).
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `S3_BUCKET` | Yes | Bucket holding evidence objects |
//! | `S3_ACCESS_KEY_ID` | Yes | S3-compatible access key |
//! | `S3_SECRET_ACCESS_KEY` | Yes | S3-compatible secret key |
//! | `S3_ENDPOINT_URL` | No | Custom endpoint (R2, MinIO, ...) |
//! | `S3_REGION` | No | Region, defaults to `auto` |
//! | `S3_PUBLIC_BASE_URL` | Yes | Public URL prefix for stored objects |

pub mod ingest;

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use uuid::Uuid;

/// Key prefix for evidence objects.
const EVIDENCE_PREFIX: &str = "evidence";

/// Errors that can occur during blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// Missing required environment variable.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },

    /// Upload failed.
    #[error("Failed to upload blob {id}: {source}")]
    Upload {
        /// Blob ID that failed to upload.
        id: String,
        /// Underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Delete failed.
    #[error("Failed to delete blob {id}: {source}")]
    Delete {
        /// Blob ID that failed to delete.
        id: String,
        /// Underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An inline-encoded payload could not be decoded.
    #[error("Invalid encoded attachment payload: {message}")]
    InvalidPayload {
        /// Description of what was wrong with the payload.
        message: String,
    },
}

/// A stored blob: its store-internal ID and its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    /// Store-internal identifier (object key).
    pub id: String,
    /// Public URL under which the blob is reachable.
    pub url: String,
}

/// Capability interface to the evidence blob store.
///
/// Deletes are best-effort from the caller's perspective: callers on
/// non-rollback paths log and swallow delete errors rather than failing
/// their primary operation.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads raw bytes, returning the stored blob's ID and URL.
    async fn upload(&self, bytes: Vec<u8>) -> Result<BlobHandle, BlobError>;

    /// Decodes an inline-encoded payload (a base64 data URI) and
    /// uploads the decoded bytes.
    async fn upload_from_encoded(&self, data: &str) -> Result<BlobHandle, BlobError> {
        let decoded = decode_payload(data)?;
        self.upload(decoded).await
    }

    /// Deletes a blob by its store-internal ID. Deleting a missing
    /// blob succeeds.
    async fn delete(&self, id: &str) -> Result<(), BlobError>;

    /// Deletes a blob by its public URL.
    async fn delete_by_url(&self, url: &str) -> Result<(), BlobError>;

    /// Whether a string attachment is an inline-encoded payload rather
    /// than an already-hosted URL.
    fn is_encoded_payload(&self, value: &str) -> bool {
        is_encoded_payload(value)
    }
}

/// Whether a string is an inline base64 data URI.
#[must_use]
pub fn is_encoded_payload(value: &str) -> bool {
    value.starts_with("data:") && value.contains(";base64,")
}

/// Decodes the base64 body of a data URI.
fn decode_payload(data: &str) -> Result<Vec<u8>, BlobError> {
    let body = data
        .split_once(";base64,")
        .filter(|_| data.starts_with("data:"))
        .map(|(_, body)| body)
        .ok_or_else(|| BlobError::InvalidPayload {
            message: "expected a base64 data URI".to_string(),
        })?;

    BASE64
        .decode(body.trim())
        .map_err(|e| BlobError::InvalidPayload {
            message: e.to_string(),
        })
}

/// Blob store backed by an S3-compatible bucket.
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// Creates a client from `S3_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::MissingEnv`] if a required variable is
    /// unset.
    pub fn from_env() -> Result<Self, BlobError> {
        let bucket = require_env("S3_BUCKET")?;
        let access_key = require_env("S3_ACCESS_KEY_ID")?;
        let secret_key = require_env("S3_SECRET_ACCESS_KEY")?;
        let public_base_url = require_env("S3_PUBLIC_BASE_URL")?;

        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string());
        let creds = Credentials::new(&access_key, &secret_key, None, None, "s3-env");

        let mut builder = aws_sdk_s3::Config::builder()
            .region(Region::new(region))
            .credentials_provider(creds)
            .force_path_style(true);

        if let Ok(endpoint) = std::env::var("S3_ENDPOINT_URL") {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }

    fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_base_url.as_str())
            .map(|rest| rest.trim_start_matches('/'))
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, bytes: Vec<u8>) -> Result<BlobHandle, BlobError> {
        let key = format!("{EVIDENCE_PREFIX}/{}", Uuid::new_v4());
        let body = aws_sdk_s3::primitives::ByteStream::from(bytes);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type("application/octet-stream")
            .send()
            .await
            .map_err(|e| BlobError::Upload {
                id: key.clone(),
                source: Box::new(e),
            })?;

        log::info!("Uploaded evidence blob {key}");

        Ok(BlobHandle {
            url: self.url_for(&key),
            id: key,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), BlobError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(id)
            .send()
            .await
            .map_err(|e| BlobError::Delete {
                id: id.to_string(),
                source: Box::new(e),
            })?;

        log::info!("Deleted evidence blob {id}");
        Ok(())
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), BlobError> {
        let Some(key) = self.key_for_url(url) else {
            // URL not under our public base; nothing to delete
            log::warn!("Ignoring delete for foreign attachment URL {url}");
            return Ok(());
        };
        let key = key.to_string();
        self.delete(&key).await
    }
}

/// In-memory blob store for local development and tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.lock().expect("blob store mutex poisoned").len()
    }

    /// Whether the store holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a blob with the given URL is stored.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn contains_url(&self, url: &str) -> bool {
        url.strip_prefix("memory://").is_some_and(|id| {
            self.objects
                .lock()
                .expect("blob store mutex poisoned")
                .contains_key(id)
        })
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bytes: Vec<u8>) -> Result<BlobHandle, BlobError> {
        let id = format!("{EVIDENCE_PREFIX}/{}", Uuid::new_v4());
        self.objects
            .lock()
            .expect("blob store mutex poisoned")
            .insert(id.clone(), bytes);

        Ok(BlobHandle {
            url: format!("memory://{id}"),
            id,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), BlobError> {
        self.objects
            .lock()
            .expect("blob store mutex poisoned")
            .remove(id);
        Ok(())
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), BlobError> {
        match url.strip_prefix("memory://") {
            Some(id) => {
                let id = id.to_string();
                self.delete(&id).await
            }
            None => Ok(()),
        }
    }
}

/// Reads a required environment variable.
fn require_env(name: &str) -> Result<String, BlobError> {
    std::env::var(name).map_err(|_| BlobError::MissingEnv {
        name: name.to_string(),
    })
}

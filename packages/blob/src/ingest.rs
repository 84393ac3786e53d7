//! Attachment ingestion: normalization of mixed attachment sources
//! into persisted URLs.
//!
//! A report's attachments can arrive in three shapes: freshly uploaded
//! file bytes, inline-encoded data strings, and already-hosted URLs.
//! [`resolve_attachments`] resolves all three into one flat URL list in
//! a single pass, staging the uploads it performs so a failed record
//! commit can roll them back ([`StagedAttachments::discard`]) without
//! leaving orphaned blobs behind.

use crate::{BlobError, BlobHandle, BlobStore};

/// One attachment as supplied by the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Raw file bytes to upload.
    File(Vec<u8>),
    /// Inline-encoded payload (base64 data URI) to decode and upload.
    Encoded(String),
    /// Already-hosted URL, passed through unchanged.
    Url(String),
}

impl AttachmentSource {
    /// Classifies a string attachment as an encoded payload or a
    /// hosted URL.
    #[must_use]
    pub fn from_string(store: &dyn BlobStore, value: String) -> Self {
        if store.is_encoded_payload(&value) {
            Self::Encoded(value)
        } else {
            Self::Url(value)
        }
    }
}

/// The outcome of a successful normalization pass: the canonical URL
/// list plus the uploads staged along the way.
///
/// Callers persist their record and then either [`commit`](Self::commit)
/// (dropping the staging bookkeeping) or, if the record commit failed,
/// [`discard`](Self::discard) to delete the staged blobs.
#[derive(Debug)]
pub struct StagedAttachments {
    urls: Vec<String>,
    staged: Vec<BlobHandle>,
}

impl StagedAttachments {
    /// The canonical persisted URL list, in input order.
    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Consumes the staging record, keeping the uploaded blobs.
    pub fn commit(self) -> Vec<String> {
        self.urls
    }

    /// Deletes every blob staged by this pass (best-effort, failures
    /// logged). Passthrough URLs are left untouched.
    pub async fn discard(self, store: &dyn BlobStore) {
        if self.staged.is_empty() {
            return;
        }
        log::warn!(
            "Rolling back {} staged attachment upload(s)",
            self.staged.len()
        );

        let deletes = self.staged.iter().map(|handle| async move {
            if let Err(e) = store.delete(&handle.id).await {
                log::error!("Failed to roll back staged blob {}: {e}", handle.id);
            }
        });
        futures::future::join_all(deletes).await;
    }
}

/// Resolves mixed attachment sources into a flat list of persisted
/// URLs.
///
/// Uploads (file bytes and encoded payloads) run in parallel with no
/// ordering requirement between them; hosted URLs pass through
/// unchanged. If any upload fails, the compensating deletes for the
/// uploads that did succeed are issued only after every upload has
/// resolved, and the first failure is surfaced.
///
/// # Errors
///
/// Returns the first [`BlobError`] encountered while uploading or
/// decoding; sibling uploads that succeeded have been rolled back by
/// then.
pub async fn resolve_attachments(
    store: &dyn BlobStore,
    sources: Vec<AttachmentSource>,
) -> Result<StagedAttachments, BlobError> {
    let uploads = sources.into_iter().map(|source| async move {
        match source {
            AttachmentSource::Url(url) => Ok((url, None)),
            AttachmentSource::File(bytes) => store
                .upload(bytes)
                .await
                .map(|handle| (handle.url.clone(), Some(handle))),
            AttachmentSource::Encoded(data) => store
                .upload_from_encoded(&data)
                .await
                .map(|handle| (handle.url.clone(), Some(handle))),
        }
    });

    let results = futures::future::join_all(uploads).await;

    let mut urls = Vec::with_capacity(results.len());
    let mut staged = Vec::new();
    let mut first_err = None;

    for result in results {
        match result {
            Ok((url, handle)) => {
                urls.push(url);
                staged.extend(handle);
            }
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                } else {
                    log::warn!("Additional attachment upload failure: {e}");
                }
            }
        }
    }

    if let Some(err) = first_err {
        StagedAttachments { urls, staged }.discard(store).await;
        return Err(err);
    }

    Ok(StagedAttachments { urls, staged })
}

/// Deletes attachment URLs from the blob store, best-effort.
///
/// Failures are logged and swallowed: losing an orphaned blob must
/// never fail the caller's primary operation.
pub async fn delete_urls_best_effort(store: &dyn BlobStore, urls: &[String]) {
    let deletes = urls.iter().map(|url| async move {
        if let Err(e) = store.delete_by_url(url).await {
            log::error!("Failed to delete attachment blob {url}: {e}");
        }
    });
    futures::future::join_all(deletes).await;
}

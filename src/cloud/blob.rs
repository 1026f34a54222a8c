use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use bytes::Bytes;
use log::{debug, warn};
use reqwest::{Client, Response};
use tokio::io::AsyncReadExt;
use tokio::time::sleep;
use url::Url;

use crate::constants::{
    BLOCK_UPLOAD_SIZE, LARGE_FILE_THRESHOLD, RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_SECS,
    STORAGE_API_VERSION, STORAGE_ERROR_CODE_HEADER,
};
use crate::errors::UploadError;
use crate::security::{display_container, scrub_credentials};

/// Destination for uploaded files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `source` as `blob_name` into the container addressed by
    /// `container_sas`. Returns the number of bytes written.
    async fn put_blob(
        &self,
        container_sas: &str,
        blob_name: &str,
        source: &Path,
    ) -> Result<u64, UploadError>;
}

/// Blob REST client authorised by container SAS URLs.
pub struct SasBlobClient {
    client: Client,
    max_retries: usize,
    /// Files larger than this are uploaded as blocks
    block_threshold: u64,
    block_size: usize,
}

impl SasBlobClient {
    pub fn new(client: Client, max_retries: usize) -> Self {
        SasBlobClient {
            client,
            max_retries,
            block_threshold: LARGE_FILE_THRESHOLD,
            block_size: BLOCK_UPLOAD_SIZE,
        }
    }

    /// Override when files switch to block upload and how large each block is.
    pub fn with_block_upload(mut self, threshold: u64, block_size: usize) -> Self {
        self.block_threshold = threshold;
        self.block_size = block_size.max(1);
        self
    }

    /// Build the blob URL: container path plus the blob name segments, with
    /// the SAS query string carried over.
    pub fn blob_url(container_sas: &str, blob_name: &str) -> Result<Url, UploadError> {
        let mut url = Url::parse(container_sas).map_err(|e| {
            UploadError::InvalidDestination(format!("{}: {}", display_container(container_sas), e))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                UploadError::InvalidDestination(format!(
                    "{} cannot address a container",
                    display_container(container_sas)
                ))
            })?;
            segments.pop_if_empty().extend(blob_name.split('/'));
        }

        Ok(url)
    }

    /// Upload a file with a single Put Blob request.
    async fn put_single(&self, url: &Url, source: &Path) -> Result<u64, UploadError> {
        let contents = tokio::fs::read(source).await.map_err(|e| io_error(source, e))?;
        let body = Bytes::from(contents);
        let size = body.len() as u64;

        self.send_with_retries(|| {
            let request = self
                .client
                .put(url.clone())
                .header("x-ms-version", STORAGE_API_VERSION)
                .header("x-ms-blob-type", "BlockBlob")
                .body(body.clone());
            async move { check_response(request.send().await?).await }
        })
        .await?;

        Ok(size)
    }

    /// Upload a large file as staged blocks followed by a block list commit.
    async fn put_blocks(&self, url: &Url, source: &Path) -> Result<u64, UploadError> {
        let mut file = tokio::fs::File::open(source)
            .await
            .map_err(|e| io_error(source, e))?;

        let mut block_ids = Vec::new();
        let mut size = 0u64;

        loop {
            let mut buffer = Vec::with_capacity(self.block_size);
            (&mut file)
                .take(self.block_size as u64)
                .read_to_end(&mut buffer)
                .await
                .map_err(|e| io_error(source, e))?;
            if buffer.is_empty() {
                break;
            }

            let block_id = block_id(block_ids.len());
            let mut block_url = url.clone();
            block_url
                .query_pairs_mut()
                .append_pair("comp", "block")
                .append_pair("blockid", &block_id);

            size += buffer.len() as u64;
            let body = Bytes::from(buffer);
            self.send_with_retries(|| {
                let request = self
                    .client
                    .put(block_url.clone())
                    .header("x-ms-version", STORAGE_API_VERSION)
                    .body(body.clone());
                async move { check_response(request.send().await?).await }
            })
            .await?;

            debug!("Staged block {} for {}", block_ids.len(), source.display());
            block_ids.push(block_id);
        }

        let mut list_url = url.clone();
        list_url.query_pairs_mut().append_pair("comp", "blocklist");
        let block_list = Bytes::from(block_list_xml(&block_ids));

        self.send_with_retries(|| {
            let request = self
                .client
                .put(list_url.clone())
                .header("x-ms-version", STORAGE_API_VERSION)
                .header(reqwest::header::CONTENT_TYPE, "application/xml")
                .body(block_list.clone());
            async move { check_response(request.send().await?).await }
        })
        .await?;

        Ok(size)
    }

    async fn send_with_retries<F, Fut>(&self, mut attempt_request: F) -> Result<(), UploadError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<(), UploadError>> + Send,
    {
        let mut attempt = 0;

        loop {
            match attempt_request().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = retry_delay(attempt);
                    warn!("Storage request attempt {} failed, retrying in {:?}: {}", attempt, delay, e);
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl BlobStore for SasBlobClient {
    async fn put_blob(
        &self,
        container_sas: &str,
        blob_name: &str,
        source: &Path,
    ) -> Result<u64, UploadError> {
        let metadata = tokio::fs::metadata(source).await.map_err(|e| io_error(source, e))?;
        let url = Self::blob_url(container_sas, blob_name)?;

        debug!(
            "Uploading {} ({} bytes) to {}/{}",
            source.display(),
            metadata.len(),
            display_container(container_sas),
            blob_name
        );

        if metadata.len() > self.block_threshold {
            self.put_blocks(&url, source).await
        } else {
            self.put_single(&url, source).await
        }
    }
}

/// Exponential backoff: 250ms * 2^attempt, capped.
pub fn retry_delay(attempt: usize) -> Duration {
    let factor = 1u64 << attempt.min(16);
    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS.saturating_mul(factor));
    delay.min(Duration::from_secs(RETRY_MAX_DELAY_SECS))
}

/// Block IDs must be base64 and all the same length within a blob.
fn block_id(index: usize) -> String {
    BASE64_STANDARD.encode(format!("block-{:08}", index))
}

fn block_list_xml(block_ids: &[String]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?><BlockList>"#);
    for id in block_ids {
        xml.push_str("<Latest>");
        xml.push_str(id);
        xml.push_str("</Latest>");
    }
    xml.push_str("</BlockList>");
    xml
}

fn io_error(path: &Path, source: std::io::Error) -> UploadError {
    if source.kind() == std::io::ErrorKind::NotFound {
        UploadError::FileNotFound(path.to_path_buf())
    } else {
        UploadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

async fn check_response(response: Response) -> Result<(), UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let error_code = response
        .headers()
        .get(STORAGE_ERROR_CODE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        scrub_credentials(body.trim())
    };

    Err(UploadError::Storage {
        status: status.as_u16(),
        error_code,
        message,
    })
}

use anyhow::{Context, Result};
use bytes::Bytes;
use futures_util::stream;
use reqwest::multipart;

use super::models::{ScanRecord, UploadScanRequest};
use crate::config::ClientConfig;
use crate::ops::ProgressReporter;

/// Client for the scan API: stores completed scans and serves history.
#[derive(Clone)]
pub struct ScanClient {
    http: reqwest::Client,
    base_url: String,
    upload_chunk_size: usize,
}

impl ScanClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.scan_api_url.trim_end_matches('/').to_string(),
            upload_chunk_size: config.upload_chunk_size.max(1),
        })
    }

    /// Store a completed scan. The image body is streamed in chunks so the
    /// reporter sees real upload progress.
    pub async fn upload_scan(
        &self,
        token: &str,
        request: UploadScanRequest,
        progress: Option<ProgressReporter>,
    ) -> Result<ScanRecord> {
        let ingredient_info_json = serde_json::to_string(&request.ingredient_info)
            .context("failed to encode ingredient info")?;
        let recommendations_json = serde_json::to_string(&request.recommendations)
            .context("failed to encode recommendations")?;

        let image = image_part(
            request.image,
            request.image_filename,
            self.upload_chunk_size,
            progress,
        )?;

        let form = multipart::Form::new()
            .text("userId", request.user_id.to_string())
            .text("resultSummary", request.result_summary)
            .text("ingredientInfoJson", ingredient_info_json)
            .text("recommendationsJson", recommendations_json)
            .text("productSafety", request.product_safety.to_string())
            .part("image", image);

        let record = self
            .http
            .post(format!("{}/scans", self.base_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .context("scan upload request failed")?
            .error_for_status()
            .context("scan API rejected the upload")?
            .json::<ScanRecord>()
            .await
            .context("failed to decode the stored scan record")?;

        Ok(record)
    }

    /// Fetch the scan history for one user.
    pub async fn fetch_user_scans(&self, token: &str, user_id: i64) -> Result<Vec<ScanRecord>> {
        let scans = self
            .http
            .get(format!("{}/scans/user/{}", self.base_url, user_id))
            .bearer_auth(token)
            .send()
            .await
            .context("scan history request failed")?
            .error_for_status()
            .context("scan API rejected the history request")?
            .json::<Vec<ScanRecord>>()
            .await
            .context("failed to decode scan history")?;
        Ok(scans)
    }
}

/// Build the multipart image part from a chunked stream, reporting
/// cumulative bytes sent as a percentage.
fn image_part(
    image: Vec<u8>,
    filename: String,
    chunk_size: usize,
    progress: Option<ProgressReporter>,
) -> Result<multipart::Part> {
    let data = Bytes::from(image);
    let len = data.len() as u64;
    let total = len.max(1);

    let mut sent: u64 = 0;
    let body_stream = stream::iter(chunk_bytes(&data, chunk_size).into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(reporter) = &progress {
            reporter.report(((sent * 100) / total) as u8);
        }
        Ok::<Bytes, std::convert::Infallible>(chunk)
    }));

    let part = multipart::Part::stream_with_length(reqwest::Body::wrap_stream(body_stream), len)
        .file_name(filename)
        .mime_str("image/jpeg")
        .context("invalid image mime type")?;
    Ok(part)
}

/// Split a buffer into zero-copy chunks of at most `chunk_size` bytes.
fn chunk_bytes(data: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    (0..data.len())
        .step_by(chunk_size)
        .map(|offset| data.slice(offset..(offset + chunk_size).min(data.len())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_the_image_into_bounded_chunks() {
        let data = Bytes::from(vec![7u8; 10]);
        let chunks = chunk_bytes(&data, 4);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(chunks.concat(), data.to_vec());
    }

    #[test]
    fn empty_image_produces_no_chunks() {
        let data = Bytes::new();
        assert!(chunk_bytes(&data, 4096).is_empty());
    }

    #[test]
    fn cumulative_percentages_end_at_one_hundred() {
        let data = Bytes::from(vec![0u8; 10]);
        let total = data.len() as u64;
        let mut sent = 0u64;
        let percentages: Vec<u8> = chunk_bytes(&data, 4)
            .iter()
            .map(|chunk| {
                sent += chunk.len() as u64;
                ((sent * 100) / total) as u8
            })
            .collect();
        assert_eq!(percentages, vec![40, 80, 100]);
    }
}

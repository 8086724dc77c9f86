use reqwest::multipart;
use serde::Deserialize;
use thiserror::Error;

use super::models::ProductAnalysis;
use crate::config::ClientConfig;

/// Errors surfaced by the ingredient-analysis service.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The service rejected the image and said why (quality checks). The
    /// message keeps the service's own wording, one reason per line.
    #[error("{}", details.join("\n"))]
    Rejected { details: Vec<String> },

    #[error("analysis service returned {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    details: Vec<String>,
}

/// Client for the remote classification service.
///
/// The service exposes no progress signal, so callers typically pair this
/// with a coordinator configured for synthetic progress.
#[derive(Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(config: &ClientConfig) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.analysis_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Upload a label photo for ingredient analysis.
    pub async fn analyze_product(
        &self,
        image: Vec<u8>,
        image_filename: &str,
        skin_type: &str,
    ) -> Result<ProductAnalysis, AnalysisError> {
        let label_file = multipart::Part::bytes(image)
            .file_name(image_filename.to_string())
            .mime_str("image/jpeg")?;
        let form = multipart::Form::new()
            .part("label_file", label_file)
            .text("skin_type", skin_type.to_string());

        let response = self
            .http
            .post(format!("{}/analyze_product", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if let Ok(body) = response.json::<RejectionBody>().await {
                if !body.details.is_empty() {
                    return Err(AnalysisError::Rejected {
                        details: body.details,
                    });
                }
                if !body.error.is_empty() {
                    return Err(AnalysisError::Rejected {
                        details: vec![body.error],
                    });
                }
            }
            return Err(AnalysisError::Status(status));
        }

        Ok(response.json::<ProductAnalysis>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_preserves_the_service_wording() {
        let err = AnalysisError::Rejected {
            details: vec![
                "The image is too blurry. Please retake with better focus.".to_string(),
                "The image is too dark. Please retake it in better lighting.".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "The image is too blurry. Please retake with better focus.\n\
             The image is too dark. Please retake it in better lighting."
        );
    }

    #[test]
    fn decodes_a_quality_rejection_body() {
        let body: RejectionBody = serde_json::from_str(
            r#"{"error": "Image quality issue detected.", "details": ["The image is skewed. Please take the photo straight-on."]}"#,
        )
        .unwrap();
        assert_eq!(body.error, "Image quality issue detected.");
        assert_eq!(body.details.len(), 1);
    }
}

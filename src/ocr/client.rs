use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Thin client for the external OCR service (spec.md §6 — Mistral-OCR shaped).
pub struct OcrClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: DocumentRef<'a>,
    include_image_base64: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum DocumentRef<'a> {
    #[serde(rename = "document_url")]
    Url { document_url: &'a str },
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    #[allow(dead_code)]
    index: u32,
    markdown: String,
}

pub struct OcrOutcome {
    pub markdown: String,
    pub pages_processed: u32,
}

impl OcrClient {
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, base_url, api_key, model, timeout })
    }

    /// Calls the external OCR service and concatenates per-page markdown with
    /// the `"\n\n---\n\n"` separator mandated by spec.md §6.
    pub async fn ocr(&self, public_pdf_url: &str) -> Result<OcrOutcome> {
        let request = OcrRequest {
            model: &self.model,
            document: DocumentRef::Url { document_url: public_pdf_url },
            include_image_base64: false,
        };

        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .context("OCR request failed")?
            .error_for_status()
            .context("OCR service returned an error status")?;

        let parsed: OcrResponse = response.json().await.context("failed to parse OCR response")?;
        let pages_processed = parsed.pages.len() as u32;
        let markdown = parsed
            .pages
            .into_iter()
            .map(|p| p.markdown)
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        Ok(OcrOutcome { markdown, pages_processed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn concatenates_pages_with_separator() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pages": [
                    {"index": 0, "markdown": "page one"},
                    {"index": 1, "markdown": "page two"},
                ],
                "model": "mistral-ocr-latest",
            })))
            .mount(&server)
            .await;

        let client = OcrClient::new(
            format!("{}/ocr", server.uri()),
            "test-key".to_string(),
            "mistral-ocr-latest".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let outcome = client.ocr("https://example.com/a.pdf").await.unwrap();
        assert_eq!(outcome.markdown, "page one\n\n---\n\npage two");
        assert_eq!(outcome.pages_processed, 2);
    }
}

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::warn;

/// Best-effort PDF archival to an S3/R2-compatible HTTP endpoint. Failures are
/// logged and never propagated (spec.md §4.4 step 3, §7).
pub struct ObjectStoreClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl ObjectStoreClient {
    pub fn new(base_url: String, bucket: String) -> Self {
        Self { http: reqwest::Client::new(), base_url, bucket }
    }

    pub fn object_key(pdf_url: &str) -> String {
        format!("pdfs/{}.pdf", URL_SAFE_NO_PAD.encode(pdf_url))
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), self.bucket, key)
    }

    /// Downloads `pdf_url` with a browser-like User-Agent and PUTs it to the bucket.
    /// Returns the object key on success, `None` on any failure (never errors).
    pub async fn archive(&self, pdf_url: &str) -> Option<String> {
        let key = Self::object_key(pdf_url);

        let bytes = match self
            .http
            .get(pdf_url)
            .header("User-Agent", "Mozilla/5.0 (compatible; diario-ingest/1.0)")
            .send()
            .await
        {
            Ok(response) => match response.bytes().await {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(pdf_url, error = %error, "failed to read pdf body for archival");
                    return None;
                }
            },
            Err(error) => {
                warn!(pdf_url, error = %error, "failed to download pdf for archival");
                return None;
            }
        };

        let put = self
            .http
            .put(self.object_url(&key))
            .header("Content-Type", "application/pdf")
            .body(bytes)
            .send()
            .await;

        match put {
            Ok(response) if response.status().is_success() => Some(key),
            Ok(response) => {
                warn!(pdf_url, status = %response.status(), "object store rejected pdf archival");
                None
            }
            Err(error) => {
                warn!(pdf_url, error = %error, "object store put failed");
                None
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.http
            .head(self.object_url(key))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// The public URL the external OCR service should fetch the PDF from.
    pub fn public_url(&self, key: &str) -> String {
        self.object_url(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_matches_format() {
        let key = ObjectStoreClient::object_key("https://example.gov.br/a.pdf");
        assert!(key.starts_with("pdfs/"));
        assert!(key.ends_with(".pdf"));
    }
}

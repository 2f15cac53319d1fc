pub mod cache;
pub mod client;
pub mod models;
pub mod object_store;
pub mod pg_store;
pub mod store;

pub use cache::{InProcessCache, KvCache};
pub use client::{OcrClient, OcrOutcome};
pub use models::OcrResult;
pub use object_store::ObjectStoreClient;
pub use pg_store::PgOcrStore;
pub use store::{MockOcrStore, OcrStore};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// KV cache key for a canonical PDF URL (spec.md §6).
pub fn cache_key(pdf_url: &str) -> String {
    format!("ocr:{}", URL_SAFE_NO_PAD.encode(pdf_url))
}

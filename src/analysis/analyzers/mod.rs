pub mod ai;
pub mod concurso;
pub mod entity;
pub mod keyword;

use async_trait::async_trait;

use crate::analysis::models::{AnalysisContext, AnalyzerOutcome, AnalyzerType};

#[async_trait]
pub trait Analyzer: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> AnalyzerType;
    fn priority(&self) -> f64;
    async fn analyze(&self, text: &str, context: &AnalysisContext) -> AnalyzerOutcome;
}

pub use ai::AiAnalyzer;
pub use concurso::ConcursoAnalyzer;
pub use entity::EntityAnalyzer;
pub use keyword::KeywordAnalyzer;

pub mod analysis_stage;
pub mod crawl_stage;
pub mod ocr_stage;
pub mod webhook_stage;

pub use analysis_stage::AnalysisStage;
pub use crawl_stage::CrawlStage;
pub use ocr_stage::OcrStage;
pub use webhook_stage::WebhookStage;

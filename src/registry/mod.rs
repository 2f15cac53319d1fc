pub mod models;
pub mod pg_store;
pub mod store;
pub mod url_resolve;

pub use models::{
    CrawlJob, CrawlJobStatus, CrawlStatus, Gazette, GazetteCandidate, GazetteCrawl, GazetteStatus,
    NewCrawlAttempt, Power, ProgressEvent,
};
pub use pg_store::PgRegistryStore;
pub use store::{MockRegistryStore, RegistryStore};
pub use url_resolve::UrlResolver;

pub mod catalog;
pub mod config;
pub mod decode;
pub mod errors;
pub mod gate;
pub mod lake;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod store;
pub mod telemetry;

use crate::catalog::Catalog;
use crate::config::FeedConfig;
use crate::errors::Result;
use crate::lake::Lake;
use crate::store::ArticleStore;
use crate::telemetry::TelemetrySink;
use std::sync::Arc;

/// The daily article feed export job.
///
/// `ArticleFeed` wires together the components of one deployment:
/// - a document store client (`ArticleStore`) scanned in full every run,
/// - the date-partitioned parquet output (`Lake`),
/// - a run-history catalog (SQLite),
/// - a telemetry sink for defective-vector count events.
///
/// The store and sink are injected so tests (and alternative deployments) can
/// substitute them; the caller owns their lifetime.
///
/// # Example
///
/// ```rust,no_run
/// use articlefeed::{ArticleFeed, config::FeedConfig};
/// use articlefeed::store::MongoArticleStore;
/// use articlefeed::telemetry::NullTelemetrySink;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = FeedConfig::new(
///         "mongodb://localhost:27017",
///         "article-data",
///         "article",
///         "/var/lib/articlefeed",
///     );
///     let store = Arc::new(MongoArticleStore::connect(&config).await?);
///     let feed = ArticleFeed::new(config, store, Arc::new(NullTelemetrySink))?;
///     let report = feed.run_daily_feed(chrono::Utc::now().date_naive()).await?;
///     println!("wrote {} rows", report.written_rows);
///     Ok(())
/// }
/// ```
pub struct ArticleFeed {
    pub config: FeedConfig,
    pub catalog: Arc<Catalog>,
    pub lake: Arc<Lake>,
    pub(crate) store: Arc<dyn ArticleStore>,
    pub(crate) telemetry: Arc<dyn TelemetrySink>,
}

impl ArticleFeed {
    /// Opens the catalog and output directory and assembles the pipeline.
    pub fn new(
        config: FeedConfig,
        store: Arc<dyn ArticleStore>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Result<Self> {
        let catalog = Arc::new(Catalog::new(&config)?);
        catalog.initialize_schema()?;
        let lake = Arc::new(Lake::new(&config.output_base_path)?);

        Ok(Self {
            config,
            catalog,
            lake,
            store,
            telemetry,
        })
    }
}

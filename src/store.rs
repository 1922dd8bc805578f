use crate::config::FeedConfig;
use crate::errors::Result;
use crate::models::RawArticle;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{Client, Collection, bson::doc};

/// The document-store seam of the pipeline.
///
/// The pipeline only ever sees this trait; the concrete client is constructed
/// and torn down by the caller.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Returns every document of the collection, unfiltered and unprojected.
    async fn fetch_all(&self) -> Result<Vec<RawArticle>>;
}

/// MongoDB-backed store performing an unconditional full scan.
///
/// Connection, authentication, and cursor errors propagate to the caller and
/// abort the run; there is no retry.
pub struct MongoArticleStore {
    collection: Collection<RawArticle>,
}

impl MongoArticleStore {
    pub async fn connect(config: &FeedConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.store_uri).await?;
        let collection = client
            .database(&config.database)
            .collection::<RawArticle>(&config.collection);
        Ok(Self { collection })
    }
}

#[async_trait]
impl ArticleStore for MongoArticleStore {
    async fn fetch_all(&self) -> Result<Vec<RawArticle>> {
        let cursor = self.collection.find(doc! {}).await?;
        let articles = cursor.try_collect().await?;
        Ok(articles)
    }
}

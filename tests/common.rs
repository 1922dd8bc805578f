use std::path::Path;
use std::sync::{Arc, Mutex};

use articlefeed::ArticleFeed;
use articlefeed::config::FeedConfig;
use articlefeed::errors::{FeedError, Result};
use articlefeed::models::RawArticle;
use articlefeed::store::ArticleStore;
use articlefeed::telemetry::{FeedEvent, TelemetrySink};
use async_trait::async_trait;
use chrono::NaiveDate;
use deltalake::arrow::array::{Array, ListArray, StringArray};
use deltalake::arrow::record_batch::RecordBatch;
use mongodb::bson::{Binary, bson, spec::BinarySubtype};

/// Store double that serves a fixed set of documents.
pub struct InMemoryStore {
    articles: Vec<RawArticle>,
}

impl InMemoryStore {
    pub fn new(articles: Vec<RawArticle>) -> Self {
        Self { articles }
    }
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn fetch_all(&self) -> Result<Vec<RawArticle>> {
        Ok(self.articles.clone())
    }
}

/// Telemetry double that records every emitted event.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<FeedEvent>>,
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn emit(&self, event: FeedEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Telemetry double whose emissions always fail.
pub struct FailingSink;

#[async_trait]
impl TelemetrySink for FailingSink {
    async fn emit(&self, _event: FeedEvent) -> Result<()> {
        Err(FeedError::Telemetry("sink offline".to_string()))
    }
}

pub fn encoded_vector(len: usize) -> Vec<u8> {
    let values: Vec<f64> = (0..len).map(|i| i as f64 * 0.25).collect();
    bincode::serialize(&values).unwrap()
}

pub fn raw_article(id: &str, vector_len: usize) -> RawArticle {
    RawArticle {
        id: id.to_string(),
        external_product_id: Some(bson!(format!("{id}-ext"))),
        image_url: Some(bson!(format!("https://img.example.com/{id}.jpg"))),
        description: Some(bson!("a sample article")),
        lead_article: Some(bson!(id)),
        product_type: Some(bson!("shirt")),
        stroke_id: Some(bson!("s-1")),
        title: Some(bson!("Sample Shirt")),
        gender: Some(bson!("W")),
        category: Some(bson!("tops")),
        master_category_breadcrumb: Some(bson!("women/tops")),
        master_category_id: Some(bson!("mc-1")),
        category_breadcrumb: Some(bson!("tops/shirts")),
        price: Some(bson!(19.5)),
        previous_price: Some(bson!(25.0)),
        stock_level: Some(bson!(40.0)),
        additional_images: Some(bson!(["u1", "u2"])),
        attributes: Some(bson!(["cotton"])),
        dominant_colour: Some(bson!(["blue"])),
        linked_articles: Some(bson!([{ "id": "other", "linkType": "outfit" }])),
        is_active: Some(bson!(true)),
        in_stock: Some(bson!(true)),
        resnet_feature_vector: Some(Binary {
            subtype: BinarySubtype::Generic,
            bytes: encoded_vector(vector_len),
        }),
    }
}

pub fn feed_over(
    base: &Path,
    articles: Vec<RawArticle>,
    sink: Arc<dyn TelemetrySink>,
) -> ArticleFeed {
    let config = FeedConfig::new("mongodb://unused:27017", "article-data", "article", base);
    ArticleFeed::new(config, Arc::new(InMemoryStore::new(articles)), sink).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn id_column(batch: &RecordBatch) -> Vec<String> {
    let ids = batch
        .column_by_name("id")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    ids.iter().map(|value| value.unwrap().to_string()).collect()
}

pub fn vector_lengths(batch: &RecordBatch) -> Vec<usize> {
    let vectors = batch
        .column_by_name("resnetFeatureVector")
        .unwrap()
        .as_any()
        .downcast_ref::<ListArray>()
        .unwrap();
    (0..vectors.len()).map(|row| vectors.value(row).len()).collect()
}

use chrono::NaiveDate;
use mongodb::bson::{Binary, Bson};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One article document as stored in the source collection.
///
/// Everything except the identifier is carried as loose BSON so that all type
/// coercion happens at the normalize boundary instead of inside serde; a
/// malformed field must surface as a cast error, not a deserialization one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub external_product_id: Option<Bson>,
    #[serde(default)]
    pub image_url: Option<Bson>,
    #[serde(default)]
    pub description: Option<Bson>,
    #[serde(default)]
    pub lead_article: Option<Bson>,
    #[serde(default)]
    pub product_type: Option<Bson>,
    #[serde(default)]
    pub stroke_id: Option<Bson>,
    #[serde(default)]
    pub title: Option<Bson>,
    #[serde(default)]
    pub gender: Option<Bson>,
    #[serde(default)]
    pub category: Option<Bson>,
    #[serde(default)]
    pub master_category_breadcrumb: Option<Bson>,
    #[serde(default)]
    pub master_category_id: Option<Bson>,
    #[serde(default)]
    pub category_breadcrumb: Option<Bson>,
    #[serde(default)]
    pub price: Option<Bson>,
    #[serde(default)]
    pub previous_price: Option<Bson>,
    #[serde(default)]
    pub stock_level: Option<Bson>,
    #[serde(default)]
    pub additional_images: Option<Bson>,
    #[serde(default)]
    pub attributes: Option<Bson>,
    #[serde(default)]
    pub dominant_colour: Option<Bson>,
    #[serde(default)]
    pub linked_articles: Option<Bson>,
    #[serde(default)]
    pub is_active: Option<Bson>,
    #[serde(default)]
    pub in_stock: Option<Bson>,
    #[serde(default)]
    pub resnet_feature_vector: Option<Binary>,
}

/// A cross-reference to another article; exactly one canonical key name
/// (`linkType`) survives normalization regardless of the source spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedArticle {
    pub id: String,
    #[serde(rename = "linkType")]
    pub link_type: String,
}

/// An article after renaming and casting, with the feature vector still in
/// its serialized form.
#[derive(Debug, Clone)]
pub struct NormalizedArticle {
    pub id: String,
    pub external_product_id: String,
    pub image_url: String,
    pub description: String,
    pub lead_article: String,
    pub product_type: String,
    pub stroke_id: String,
    pub title: String,
    pub gender: String,
    pub category: String,
    pub master_category_breadcrumb: String,
    pub master_category_id: String,
    pub category_breadcrumb: String,
    pub price: f64,
    pub previous_price: f64,
    pub stock_level: f64,
    pub additional_images: Vec<String>,
    pub attributes: Vec<String>,
    pub dominant_colour: Vec<String>,
    pub linked_articles: Vec<LinkedArticle>,
    pub is_active: bool,
    pub in_stock: bool,
    pub feature_blob: Vec<u8>,
}

impl NormalizedArticle {
    /// Attaches the decoded feature vector, producing the output-ready record.
    pub fn into_article(self, resnet_feature_vector: Vec<f64>) -> Article {
        Article {
            id: self.id,
            external_product_id: self.external_product_id,
            image_url: self.image_url,
            description: self.description,
            lead_article: self.lead_article,
            product_type: self.product_type,
            stroke_id: self.stroke_id,
            title: self.title,
            gender: self.gender,
            category: self.category,
            master_category_breadcrumb: self.master_category_breadcrumb,
            master_category_id: self.master_category_id,
            category_breadcrumb: self.category_breadcrumb,
            price: self.price,
            previous_price: self.previous_price,
            stock_level: self.stock_level,
            additional_images: self.additional_images,
            attributes: self.attributes,
            resnet_feature_vector,
            dominant_colour: self.dominant_colour,
            linked_articles: self.linked_articles,
            is_active: self.is_active,
            in_stock: self.in_stock,
        }
    }
}

/// The fixed-schema record written to the daily partition.
#[derive(Debug, Clone)]
pub struct Article {
    pub id: String,
    pub external_product_id: String,
    pub image_url: String,
    pub description: String,
    pub lead_article: String,
    pub product_type: String,
    pub stroke_id: String,
    pub title: String,
    pub gender: String,
    pub category: String,
    pub master_category_breadcrumb: String,
    pub master_category_id: String,
    pub category_breadcrumb: String,
    pub price: f64,
    pub previous_price: f64,
    pub stock_level: f64,
    pub additional_images: Vec<String>,
    pub attributes: Vec<String>,
    pub resnet_feature_vector: Vec<f64>,
    pub dominant_colour: Vec<String>,
    pub linked_articles: Vec<LinkedArticle>,
    pub is_active: bool,
    pub in_stock: bool,
}

/// Summary of one pipeline run, returned to the caller and serialized into
/// the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedReport {
    pub run_date: NaiveDate,
    pub total_rows: usize,
    pub defective_rows: usize,
    pub recovered_rows: usize,
    pub written_rows: usize,
    pub partition_path: PathBuf,
}

// --- Run catalog (SQLite) models ---

#[derive(Debug)]
pub struct RunLog {
    pub run_id: String,
    pub run_date: String,
    pub started_at: i64, // Unix timestamp
    pub finished_at: Option<i64>,
    pub status: String,
    pub details: String,
}

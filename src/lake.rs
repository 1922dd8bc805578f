use crate::errors::Result;
use crate::models::Article;
use chrono::NaiveDate;
use deltalake::arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Float64Builder, ListBuilder, StringArray, StringBuilder,
    StructBuilder,
};
use deltalake::arrow::compute::concat_batches;
use deltalake::arrow::datatypes::{DataType, Field, Fields, Schema, SchemaRef};
use deltalake::arrow::record_batch::RecordBatch;
use deltalake::parquet::arrow::ArrowWriter;
use deltalake::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use deltalake::parquet::basic::Compression;
use deltalake::parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const PART_FILE: &str = "part-00000.parquet";

/// Arrow schema of the daily feed partition. Column names are the camelCase
/// output names; the builder functions below tie each column to its `Article`
/// field, so schema and record type cannot drift apart without a type error.
pub fn feed_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("externalProductId", DataType::Utf8, false),
        Field::new("imageUrl", DataType::Utf8, false),
        Field::new("description", DataType::Utf8, false),
        Field::new("leadArticle", DataType::Utf8, false),
        Field::new("productType", DataType::Utf8, false),
        Field::new("strokeId", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("masterCategoryBreadcrumb", DataType::Utf8, false),
        Field::new("masterCategoryId", DataType::Utf8, false),
        Field::new("categoryBreadCrumb", DataType::Utf8, false),
        Field::new("price", DataType::Float64, false),
        Field::new("previousPrice", DataType::Float64, false),
        Field::new("stockLevel", DataType::Float64, false),
        Field::new("additionalImages", list_of(DataType::Utf8), false),
        Field::new("attributes", list_of(DataType::Utf8), false),
        Field::new("resnetFeatureVector", list_of(DataType::Float64), false),
        Field::new("dominantColour", list_of(DataType::Utf8), false),
        Field::new("linkedArticles", list_of(linked_article_struct()), false),
        Field::new("isActive", DataType::Boolean, false),
        Field::new("inStock", DataType::Boolean, false),
    ]))
}

fn list_of(item: DataType) -> DataType {
    DataType::List(Arc::new(Field::new("item", item, true)))
}

fn linked_article_fields() -> Vec<Field> {
    vec![
        Field::new("id", DataType::Utf8, true),
        Field::new("linkType", DataType::Utf8, true),
    ]
}

fn linked_article_struct() -> DataType {
    DataType::Struct(Fields::from(linked_article_fields()))
}

/// Builds the typed batch for a slice of output-ready articles.
pub fn record_batch(articles: &[Article]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        string_column(articles, |a| &a.id),
        string_column(articles, |a| &a.external_product_id),
        string_column(articles, |a| &a.image_url),
        string_column(articles, |a| &a.description),
        string_column(articles, |a| &a.lead_article),
        string_column(articles, |a| &a.product_type),
        string_column(articles, |a| &a.stroke_id),
        string_column(articles, |a| &a.title),
        string_column(articles, |a| &a.gender),
        string_column(articles, |a| &a.category),
        string_column(articles, |a| &a.master_category_breadcrumb),
        string_column(articles, |a| &a.master_category_id),
        string_column(articles, |a| &a.category_breadcrumb),
        double_column(articles, |a| a.price),
        double_column(articles, |a| a.previous_price),
        double_column(articles, |a| a.stock_level),
        string_list_column(articles, |a| &a.additional_images),
        string_list_column(articles, |a| &a.attributes),
        feature_vector_column(articles),
        string_list_column(articles, |a| &a.dominant_colour),
        linked_articles_column(articles),
        bool_column(articles, |a| a.is_active),
        bool_column(articles, |a| a.in_stock),
    ];

    Ok(RecordBatch::try_new(feed_schema(), columns)?)
}

fn string_column(articles: &[Article], value: fn(&Article) -> &str) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(
        articles.iter().map(value),
    ))
}

fn double_column(articles: &[Article], value: fn(&Article) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(
        articles.iter().map(value),
    ))
}

fn bool_column(articles: &[Article], value: fn(&Article) -> bool) -> ArrayRef {
    Arc::new(BooleanArray::from_iter(
        articles.iter().map(|article| Some(value(article))),
    ))
}

fn string_list_column(articles: &[Article], values: fn(&Article) -> &[String]) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for article in articles {
        for value in values(article) {
            builder.values().append_value(value);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

fn feature_vector_column(articles: &[Article]) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for article in articles {
        builder.values().append_slice(&article.resnet_feature_vector);
        builder.append(true);
    }
    Arc::new(builder.finish())
}

fn linked_articles_column(articles: &[Article]) -> ArrayRef {
    let mut builder = ListBuilder::new(StructBuilder::from_fields(linked_article_fields(), 0));
    for article in articles {
        let entries = builder.values();
        for link in &article.linked_articles {
            entries
                .field_builder::<StringBuilder>(0)
                .unwrap()
                .append_value(&link.id);
            entries
                .field_builder::<StringBuilder>(1)
                .unwrap()
                .append_value(&link.link_type);
            entries.append(true);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

/// Date-partitioned parquet store for the exported feed.
///
/// One directory per calendar day (`<base>/<YYYY>/<MM>/<DD>`); writing a
/// partition is destructive to whatever was at that exact path before.
pub struct Lake {
    base_path: PathBuf,
}

impl Lake {
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn partition_path(&self, date: NaiveDate) -> PathBuf {
        self.base_path.join(date.format("%Y/%m/%d").to_string())
    }

    /// Concatenates the given batches (row union, no deduplication) and
    /// replaces the partition for `date` with the result.
    ///
    /// There is no partial-write recovery: a failure mid-write leaves the
    /// partition in an undefined state and re-running the day is the fix.
    pub fn write_partition(&self, date: NaiveDate, batches: &[RecordBatch]) -> Result<usize> {
        let schema = feed_schema();
        let combined = concat_batches(&schema, batches)?;

        let dir = self.partition_path(date);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;

        let part = dir.join(PART_FILE);
        let file = File::create(&part)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&combined)?;
        writer.close()?;

        log::info!("wrote {} rows to {}", combined.num_rows(), part.display());
        Ok(combined.num_rows())
    }

    /// Reads the partition for `date` into a single batch.
    ///
    /// `Ok(None)` means the partition does not exist (or holds no rows);
    /// errors are reserved for partitions that exist but cannot be read.
    pub fn read_partition(&self, date: NaiveDate) -> Result<Option<RecordBatch>> {
        let dir = self.partition_path(date);
        if !dir.exists() {
            return Ok(None);
        }

        let mut parts: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "parquet"))
            .collect();
        parts.sort();

        let mut schema: Option<SchemaRef> = None;
        let mut batches = Vec::new();
        for part in parts {
            let file = File::open(&part)?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
            for batch in reader {
                let batch = batch?;
                schema.get_or_insert_with(|| batch.schema());
                batches.push(batch);
            }
        }

        match schema {
            Some(schema) => Ok(Some(concat_batches(&schema, &batches)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkedArticle;
    use tempfile::tempdir;

    fn sample_article(id: &str, vector_len: usize) -> Article {
        Article {
            id: id.to_string(),
            external_product_id: format!("{id}-ext"),
            image_url: format!("https://img.example.com/{id}.jpg"),
            description: "sample".to_string(),
            lead_article: id.to_string(),
            product_type: "shirt".to_string(),
            stroke_id: "s-1".to_string(),
            title: "Sample".to_string(),
            gender: "W".to_string(),
            category: "tops".to_string(),
            master_category_breadcrumb: "women/tops".to_string(),
            master_category_id: "mc-1".to_string(),
            category_breadcrumb: "tops/shirts".to_string(),
            price: 19.5,
            previous_price: 25.0,
            stock_level: 40.0,
            additional_images: vec!["u1".to_string()],
            attributes: vec!["cotton".to_string()],
            resnet_feature_vector: (0..vector_len).map(|i| i as f64).collect(),
            dominant_colour: vec!["blue".to_string()],
            linked_articles: vec![LinkedArticle {
                id: "other".to_string(),
                link_type: "outfit".to_string(),
            }],
            is_active: true,
            in_stock: false,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn partition_path_is_zero_padded() {
        let dir = tempdir().unwrap();
        let lake = Lake::new(dir.path()).unwrap();
        let path = lake.partition_path(day(2021, 7, 5));
        assert!(path.ends_with("2021/07/05"));
    }

    #[test]
    fn write_then_read_round_trips_rows_and_schema() {
        let dir = tempdir().unwrap();
        let lake = Lake::new(dir.path()).unwrap();
        let date = day(2021, 7, 17);

        let batch = record_batch(&[sample_article("a1", 64), sample_article("a2", 64)]).unwrap();
        let written = lake.write_partition(date, &[batch]).unwrap();
        assert_eq!(written, 2);

        let read = lake.read_partition(date).unwrap().unwrap();
        assert_eq!(read.num_rows(), 2);
        for (expected, actual) in feed_schema().fields().iter().zip(read.schema().fields()) {
            assert_eq!(expected.name(), actual.name());
            assert_eq!(expected.data_type(), actual.data_type());
        }
    }

    #[test]
    fn writing_a_partition_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let lake = Lake::new(dir.path()).unwrap();
        let date = day(2021, 7, 17);

        let first = record_batch(&[
            sample_article("a1", 64),
            sample_article("a2", 64),
            sample_article("a3", 64),
        ])
        .unwrap();
        lake.write_partition(date, &[first]).unwrap();

        let second = record_batch(&[sample_article("a9", 64)]).unwrap();
        lake.write_partition(date, &[second]).unwrap();

        let read = lake.read_partition(date).unwrap().unwrap();
        assert_eq!(read.num_rows(), 1);
    }

    #[test]
    fn missing_partition_reads_as_none() {
        let dir = tempdir().unwrap();
        let lake = Lake::new(dir.path()).unwrap();
        assert!(lake.read_partition(day(2021, 7, 17)).unwrap().is_none());
    }

    #[test]
    fn multiple_batches_union_without_dedup() {
        let dir = tempdir().unwrap();
        let lake = Lake::new(dir.path()).unwrap();
        let date = day(2021, 7, 17);

        let today = record_batch(&[sample_article("a1", 64)]).unwrap();
        let recovered = record_batch(&[sample_article("a1", 64)]).unwrap();
        lake.write_partition(date, &[today, recovered]).unwrap();

        let read = lake.read_partition(date).unwrap().unwrap();
        assert_eq!(read.num_rows(), 2);
    }
}

use crate::errors::{FeedError, Result};
use crate::models::{LinkedArticle, NormalizedArticle, RawArticle};
use mongodb::bson::Bson;

/// Renames and casts one raw document into the fixed output schema.
///
/// The snake_case → camelCase rename mapping is realized by construction: the
/// source field and target column are tied together per line below, so a
/// missing mapping is a compile error rather than a silently dropped column.
///
/// Casting is strict for measures: a value that is not numeric (or a numeric
/// string) in a double column, or not a boolean in a boolean column, fails
/// the whole run. String columns accept any scalar, and a missing string
/// becomes the empty string. Sequence columns never fail: a non-list value
/// normalizes to an empty sequence.
pub fn normalize(raw: RawArticle) -> Result<NormalizedArticle> {
    let feature_blob = raw
        .resnet_feature_vector
        .map(|binary| binary.bytes)
        .ok_or_else(|| FeedError::SchemaCast {
            field: "resnet_feature_vector",
            value: "missing binary payload".to_string(),
        })?;

    Ok(NormalizedArticle {
        id: raw.id,
        external_product_id: string_field(raw.external_product_id),
        image_url: string_field(raw.image_url),
        description: string_field(raw.description),
        lead_article: string_field(raw.lead_article),
        product_type: string_field(raw.product_type),
        stroke_id: string_field(raw.stroke_id),
        title: string_field(raw.title),
        gender: string_field(raw.gender),
        category: string_field(raw.category),
        master_category_breadcrumb: string_field(raw.master_category_breadcrumb),
        master_category_id: string_field(raw.master_category_id),
        category_breadcrumb: string_field(raw.category_breadcrumb),
        price: double_field("price", raw.price)?,
        previous_price: double_field("previous_price", raw.previous_price)?,
        stock_level: double_field("stock_level", raw.stock_level)?,
        additional_images: string_seq(raw.additional_images),
        attributes: string_seq(raw.attributes),
        dominant_colour: string_seq(raw.dominant_colour),
        linked_articles: linked_articles(raw.linked_articles),
        is_active: bool_field("is_active", raw.is_active)?,
        in_stock: bool_field("in_stock", raw.in_stock)?,
        feature_blob,
    })
}

fn scalar_string(value: Bson) -> String {
    match value {
        Bson::String(s) => s,
        Bson::Double(v) => v.to_string(),
        Bson::Int32(v) => v.to_string(),
        Bson::Int64(v) => v.to_string(),
        Bson::Boolean(v) => v.to_string(),
        Bson::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_field(value: Option<Bson>) -> String {
    value.map(scalar_string).unwrap_or_default()
}

fn double_field(field: &'static str, value: Option<Bson>) -> Result<f64> {
    match value {
        Some(Bson::Double(v)) => Ok(v),
        Some(Bson::Int32(v)) => Ok(f64::from(v)),
        Some(Bson::Int64(v)) => Ok(v as f64),
        Some(Bson::String(s)) => s.trim().parse::<f64>().map_err(|_| FeedError::SchemaCast {
            field,
            value: format!("{s:?}"),
        }),
        other => Err(FeedError::SchemaCast {
            field,
            value: describe(other),
        }),
    }
}

fn bool_field(field: &'static str, value: Option<Bson>) -> Result<bool> {
    match value {
        Some(Bson::Boolean(v)) => Ok(v),
        other => Err(FeedError::SchemaCast {
            field,
            value: describe(other),
        }),
    }
}

fn string_seq(value: Option<Bson>) -> Vec<String> {
    match value {
        Some(Bson::Array(items)) => items.into_iter().map(scalar_string).collect(),
        _ => Vec::new(),
    }
}

/// Rewrites each linked-article entry so only the canonical `linkType` key
/// survives; entries that are not documents are dropped, and any non-list
/// value normalizes to an empty sequence.
fn linked_articles(value: Option<Bson>) -> Vec<LinkedArticle> {
    let Some(Bson::Array(items)) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Bson::Document(mut doc) => {
                let link_type = doc
                    .remove("linkType")
                    .or_else(|| doc.remove("link_type"))
                    .map(scalar_string)
                    .unwrap_or_default();
                let id = doc
                    .remove("id")
                    .or_else(|| doc.remove("article_id"))
                    .map(scalar_string)
                    .unwrap_or_default();
                Some(LinkedArticle { id, link_type })
            }
            _ => None,
        })
        .collect()
}

fn describe(value: Option<Bson>) -> String {
    match value {
        Some(bson) => format!("{bson:?}"),
        None => "missing value".to_string(),
    }
}

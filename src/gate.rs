use crate::errors::{FeedError, Result};
use crate::lake::Lake;
use crate::models::Article;
use crate::telemetry::{FeedEvent, TelemetrySink};
use chrono::NaiveDate;
use deltalake::arrow::array::{Array, BooleanArray, StringArray};
use deltalake::arrow::compute::filter_record_batch;
use deltalake::arrow::record_batch::RecordBatch;
use std::collections::HashSet;

/// Longest decoded vector length still considered defective.
pub const DEFECTIVE_VECTOR_MAX: usize = 50;

/// Result of the quality gate: today's valid rows plus any rows recovered
/// from the previous day's partition for defective identifiers.
pub struct GateOutcome {
    pub valid: Vec<Article>,
    pub recovered: Option<RecordBatch>,
    pub defective_rows: usize,
    pub recovered_rows: usize,
}

/// Splits off articles whose decoded vector is defective (length ≤ 50).
///
/// When defective rows exist, one count event is emitted (best-effort) and a
/// single attempt is made to recover matching rows from the previous day's
/// partition. Recovery failures of any kind downgrade to "unavailable", and
/// defective rows without a previous-day match are dropped from the output.
pub async fn apply(
    articles: Vec<Article>,
    lake: &Lake,
    run_date: NaiveDate,
    telemetry: &dyn TelemetrySink,
) -> Result<GateOutcome> {
    let (valid, defective): (Vec<_>, Vec<_>) = articles
        .into_iter()
        .partition(|article| article.resnet_feature_vector.len() > DEFECTIVE_VECTOR_MAX);

    if defective.is_empty() {
        return Ok(GateOutcome {
            valid,
            recovered: None,
            defective_rows: 0,
            recovered_rows: 0,
        });
    }

    log::warn!("{} articles with defective feature vectors", defective.len());
    for article in &defective {
        log::debug!("defective feature vector for article {}", article.id);
    }

    let event = FeedEvent::vector_errors(defective.len() as u64);
    if let Err(err) = telemetry.emit(event).await {
        log::warn!("failed to emit defective-vector event: {err}");
    }

    let defective_ids: HashSet<String> = defective
        .iter()
        .map(|article| article.id.clone())
        .collect();
    let recovered = match run_date.pred_opt() {
        Some(previous_day) => recover_previous_rows(lake, previous_day, &defective_ids),
        None => None,
    };
    let recovered_rows = recovered.as_ref().map_or(0, RecordBatch::num_rows);

    Ok(GateOutcome {
        valid,
        recovered,
        defective_rows: defective.len(),
        recovered_rows,
    })
}

/// One best-effort read of yesterday's partition; any failure means no
/// recovery, never an aborted run.
fn recover_previous_rows(
    lake: &Lake,
    previous_day: NaiveDate,
    defective_ids: &HashSet<String>,
) -> Option<RecordBatch> {
    let batch = match lake.read_partition(previous_day) {
        Ok(Some(batch)) => batch,
        Ok(None) => {
            log::info!("no partition for {previous_day}; defective articles are dropped");
            return None;
        }
        Err(err) => {
            log::warn!("could not read partition for {previous_day}: {err}");
            return None;
        }
    };

    match filter_by_id(&batch, defective_ids) {
        Ok(filtered) if filtered.num_rows() > 0 => {
            log::info!(
                "recovered {} articles from {previous_day}",
                filtered.num_rows()
            );
            Some(filtered)
        }
        Ok(_) => {
            log::info!("no matching articles in {previous_day} partition");
            None
        }
        Err(err) => {
            log::warn!("could not match previous-day articles: {err}");
            None
        }
    }
}

fn filter_by_id(batch: &RecordBatch, ids: &HashSet<String>) -> Result<RecordBatch> {
    let column = batch
        .column_by_name("id")
        .ok_or_else(|| FeedError::Recovery("previous partition has no 'id' column".to_string()))?;
    let column = column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| FeedError::Recovery("previous partition 'id' column is not utf8".to_string()))?;

    let mask: BooleanArray = column
        .iter()
        .map(|value| Some(value.is_some_and(|id| ids.contains(id))))
        .collect();
    Ok(filter_record_batch(batch, &mask)?)
}

use crate::ArticleFeed;
use crate::decode::decode_feature_vector;
use crate::errors::Result;
use crate::gate;
use crate::lake::record_batch;
use crate::models::FeedReport;
use crate::normalize::normalize;
use chrono::NaiveDate;
use uuid::Uuid;

impl ArticleFeed {
    /// Runs the daily export for `run_date` and returns the run summary.
    ///
    /// The run is logged in the catalog as RUNNING and closed as SUCCESS (with
    /// the serialized report) or FAILED (with the error text). Fatal errors
    /// (store access, schema cast, vector decode, partition write) propagate
    /// to the caller with no partition guarantees for the day.
    pub async fn run_daily_feed(&self, run_date: NaiveDate) -> Result<FeedReport> {
        let run_id = Uuid::new_v4().to_string();
        self.catalog.create_run_log(&run_id, run_date)?;

        match self.execute(run_date).await {
            Ok(report) => {
                let details = serde_json::to_string(&report)?;
                self.catalog.finish_run_log(&run_id, "SUCCESS", &details)?;
                Ok(report)
            }
            Err(err) => {
                if let Err(log_err) =
                    self.catalog.finish_run_log(&run_id, "FAILED", &err.to_string())
                {
                    log::warn!("failed to record run failure: {log_err}");
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, run_date: NaiveDate) -> Result<FeedReport> {
        let raw = self.store.fetch_all().await?;
        let total_rows = raw.len();
        log::info!(
            "loaded {total_rows} documents from collection '{}'",
            self.config.collection
        );

        let mut articles = Vec::with_capacity(total_rows);
        for document in raw {
            let normalized = normalize(document)?;
            let vector = decode_feature_vector(&normalized.feature_blob)?;
            articles.push(normalized.into_article(vector));
        }

        let outcome = gate::apply(articles, &self.lake, run_date, self.telemetry.as_ref()).await?;
        log::info!("articles count - {}", outcome.valid.len());

        let today = record_batch(&outcome.valid)?;
        let batches = match outcome.recovered {
            Some(recovered) => vec![today, recovered],
            None => vec![today],
        };
        let written_rows = self.lake.write_partition(run_date, &batches)?;

        Ok(FeedReport {
            run_date,
            total_rows,
            defective_rows: outcome.defective_rows,
            recovered_rows: outcome.recovered_rows,
            written_rows,
            partition_path: self.lake.partition_path(run_date),
        })
    }
}

//! Traversal engine: the paginated table walk
//!
//! Probes rows by ordinal within the current visible set, extracts a record
//! per row, and on each missing-row boundary delegates to the advancer to
//! click, scroll, or stop. Duplicate-batch detection converts every
//! non-progressing pagination attempt into a stop, so the walk is finite even
//! against a looping page source.

mod advance;
mod dedup;
mod extract;

pub use advance::AdvanceSignal;
pub use dedup::batch_progressed;
pub use extract::extract_row;

use std::mem::take;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::driver::{PageDriver, RowProbe};
use crate::error::ScrapeError;
use crate::output::ScrapeResult;
use crate::schema::{PaginationConfig, TableSchema};

/// Drives one scrape run over a single page session.
///
/// The engine exclusively owns the session for the whole run: all DOM access
/// is sequential, one probe outstanding at a time.
pub struct TableScraper {
    driver: Arc<dyn PageDriver>,
    schema: TableSchema,
    pagination: PaginationConfig,
}

impl TableScraper {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        schema: TableSchema,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            driver,
            schema,
            pagination,
        }
    }

    /// Walk the table and collect up to `target_rows` records (0 = unbounded).
    ///
    /// `page_load_wait` bounds each page-readiness poll; it is an advisory
    /// budget, not a hard deadline. Returns the header plus all records in
    /// traversal order. The only errors surfaced here are a row locator that
    /// never appears at all; pagination dead-ends terminate the walk
    /// gracefully with the partial result.
    pub async fn scrape(
        &self,
        target_rows: usize,
        page_load_wait: Duration,
    ) -> Result<ScrapeResult, ScrapeError> {
        wait_for_page_load(&*self.driver, page_load_wait).await;
        self.driver
            .wait_until_visible(self.schema.row_locator(), page_load_wait)
            .await?;

        let mut records: Vec<Vec<String>> = Vec::new();
        let mut last_batch: Vec<Vec<String>> = Vec::new();
        let mut current_batch: Vec<Vec<String>> = Vec::new();

        // 1-based probe position within the current visible row set.
        let mut row_index: usize = 1;
        let mut collected: usize = 0;

        while target_rows == 0 || collected < target_rows {
            match self
                .driver
                .probe_row(self.schema.row_locator(), row_index)
                .await
            {
                RowProbe::Found(row) => {
                    let record = extract_row(&*row, &self.schema).await;
                    current_batch.push(record.clone());
                    records.push(record);
                    collected += 1;
                }
                RowProbe::Boundary => {
                    debug!(row_index, collected, "row missing, running advancer");
                    let signal = advance::advance(
                        &*self.driver,
                        &self.pagination,
                        &last_batch,
                        &current_batch,
                        page_load_wait,
                    )
                    .await;

                    match signal {
                        AdvanceSignal::ScrollReset => {
                            let rewind = self.pagination.scroll_reset_count() as usize;
                            row_index = row_index.saturating_sub(rewind);
                            last_batch = take(&mut current_batch);
                        }
                        AdvanceSignal::PageReset => {
                            row_index = 0;
                            last_batch = take(&mut current_batch);
                        }
                        AdvanceSignal::StopAndRevert => {
                            let trailing = current_batch.len();
                            records.truncate(records.len().saturating_sub(trailing));
                            break;
                        }
                        AdvanceSignal::Stop => break,
                    }
                }
            }
            row_index += 1;
        }

        info!(records = records.len(), "scrape complete");
        Ok(ScrapeResult::new(self.schema.header(), records))
    }
}

/// Poll for page-load quiescence: document fully loaded and no known pending
/// asynchronous requests.
///
/// Soft timeout: once `wait` elapses the caller proceeds regardless, on the
/// theory that a page stuck loading forever still has its rendered rows.
pub async fn wait_for_page_load(driver: &dyn PageDriver, wait: Duration) {
    let start = Instant::now();
    loop {
        let ready = match driver.ready_state().await {
            Ok(state) => state == "complete",
            Err(e) => {
                warn!(error = %e, "readyState probe failed, assuming page is ready");
                return;
            }
        };
        // Pages without the counter report 0 and quiesce on readyState alone.
        let pending = driver.pending_requests().await.unwrap_or(0);

        if ready && pending == 0 {
            return;
        }
        if start.elapsed() >= wait {
            warn!(
                wait_secs = wait.as_secs(),
                "page never reached quiescence, proceeding anyway"
            );
            return;
        }

        debug!(ready, pending, "waiting for page to load");
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

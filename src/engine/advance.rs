//! Page/scroll advancer: the pagination state machine
//!
//! Runs when a row probe comes back [`crate::RowProbe::Boundary`] and decides
//! how the traversal proceeds. Ordering matters: the configured pagination
//! mode is attempted first, and duplicate-batch comparison acts as the
//! fallback termination guarantee for sites whose last-page control never
//! reports itself disabled.

use std::time::Duration;

use tracing::{info, warn};

use crate::driver::PageDriver;
use crate::schema::PaginationConfig;

use super::dedup::batch_progressed;
use super::wait_for_page_load;

/// Pause after clicking a next control before probing page readiness,
/// giving the site's own scripts a chance to start re-rendering.
const POST_CLICK_SETTLE: Duration = Duration::from_secs(2);

/// Instruction returned to the traversal loop after a missing-row boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceSignal {
    /// Traversal is done; keep everything collected so far.
    Stop,
    /// Traversal is done and the just-collected batch duplicates the previous
    /// one; the caller must truncate those trailing records.
    StopAndRevert,
    /// A new page rendered; rewind the row index to the top and re-probe.
    PageReset,
    /// The window scrolled; rewind the row index by the configured reset
    /// count and re-probe.
    ScrollReset,
}

enum NextControl {
    Ready(Box<dyn crate::driver::ElementHandle>),
    Disabled,
    Missing,
}

/// Execute the pagination policy once and emit the resulting signal.
///
/// `last_batch` and `current_batch` are the records collected before and
/// since the previous successful advance; they feed the duplicate check.
pub(super) async fn advance(
    driver: &dyn PageDriver,
    pagination: &PaginationConfig,
    last_batch: &[Vec<String>],
    current_batch: &[Vec<String>],
    page_load_wait: Duration,
) -> AdvanceSignal {
    if pagination.scroll_enabled() {
        return advance_by_scroll(driver, pagination, last_batch, current_batch).await;
    }

    let Some(locator) = pagination.next_control_locator() else {
        info!("no pagination configured, stopping after single page");
        return AdvanceSignal::Stop;
    };

    match inspect_next_control(driver, locator).await {
        NextControl::Ready(control) => {
            if let Err(e) = control.click().await {
                // Navigation failure: keep the partial result, end the run.
                warn!(locator, error = %e, "next-control click failed, stopping");
                return AdvanceSignal::Stop;
            }
            tokio::time::sleep(POST_CLICK_SETTLE).await;
            wait_for_page_load(driver, page_load_wait).await;

            // A clicked control proves nothing by itself: broken controls
            // re-render the same page. The duplicate check decides.
            if batch_progressed(last_batch, current_batch) {
                AdvanceSignal::PageReset
            } else {
                info!("pagination loop detected after click, reverting duplicate batch");
                AdvanceSignal::StopAndRevert
            }
        }
        NextControl::Disabled => {
            // Exhausted ("Next" disabled on the last page). Only revert when
            // the trailing batch is a confirmed duplicate; a disabled control
            // over genuinely new rows keeps them.
            if !current_batch.is_empty() && !batch_progressed(last_batch, current_batch) {
                info!("next control disabled over duplicate batch, reverting");
                AdvanceSignal::StopAndRevert
            } else {
                info!("next control disabled or hidden, pagination exhausted");
                AdvanceSignal::Stop
            }
        }
        NextControl::Missing => {
            info!(locator, "next control not found, stopping");
            AdvanceSignal::Stop
        }
    }
}

async fn advance_by_scroll(
    driver: &dyn PageDriver,
    pagination: &PaginationConfig,
    last_batch: &[Vec<String>],
    current_batch: &[Vec<String>],
) -> AdvanceSignal {
    // Scrolling never reports exhaustion on its own; two consecutive scroll
    // windows with identical content are the stop condition.
    if !batch_progressed(last_batch, current_batch) {
        info!("scroll window content unchanged, stopping and reverting duplicates");
        return AdvanceSignal::StopAndRevert;
    }

    match driver
        .scroll_by(i64::from(pagination.scroll_step_pixels()))
        .await
    {
        Ok(()) => AdvanceSignal::ScrollReset,
        Err(e) => {
            warn!(error = %e, "scroll failed, stopping with partial result");
            AdvanceSignal::Stop
        }
    }
}

async fn inspect_next_control(driver: &dyn PageDriver, locator: &str) -> NextControl {
    let control = match driver.find_element(locator).await {
        Ok(control) => control,
        Err(_) => return NextControl::Missing,
    };

    let displayed = control.is_displayed().await.unwrap_or(false);
    let enabled = control.is_enabled().await.unwrap_or(false);
    if displayed && enabled {
        NextControl::Ready(control)
    } else {
        NextControl::Disabled
    }
}

//! End-to-end traversal tests against a scripted in-memory page driver.
//!
//! The mock driver plays back a fixed sequence of "pages" (row sets plus a
//! next-control state per page), so the full engine loop runs without a
//! browser: probe, extract, advance, duplicate detection, revert.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use gridscrape::{
    DriverError, ElementHandle, FieldRule, Normalizer, PageDriver, PaginationConfig, RowProbe,
    TableSchema, TableScraper,
};

const ROW_LOCATOR: &str = ".row";
const NEXT_LOCATOR: &str = ".next";

/// One scripted page: its rows (cell texts) and the next-control state.
#[derive(Clone)]
struct PageSpec {
    rows: Vec<Vec<String>>,
    /// `Some(enabled)` when a next control is present, `None` when absent.
    next_control: Option<bool>,
}

fn page(rows: &[&[&str]], next_control: Option<bool>) -> PageSpec {
    PageSpec {
        rows: rows
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
        next_control,
    }
}

struct ClickState {
    pages: Vec<PageSpec>,
    current: usize,
    clicks: usize,
    /// When set, every next-control click fails without navigating.
    broken_clicks: bool,
}

/// Click-paginated driver. A click advances to the next scripted page; a
/// click on the final page re-renders it unchanged (a broken control).
struct ClickDriver {
    state: Arc<Mutex<ClickState>>,
}

impl ClickDriver {
    fn new(pages: Vec<PageSpec>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClickState {
                pages,
                current: 0,
                clicks: 0,
                broken_clicks: false,
            })),
        }
    }

    fn with_broken_clicks(pages: Vec<PageSpec>) -> Self {
        let driver = Self::new(pages);
        driver.state.lock().unwrap().broken_clicks = true;
        driver
    }

    fn clicks(&self) -> usize {
        self.state.lock().unwrap().clicks
    }
}

#[async_trait]
impl PageDriver for ClickDriver {
    async fn probe_row(&self, selector: &str, ordinal: usize) -> RowProbe {
        assert_eq!(selector, ROW_LOCATOR);
        let state = self.state.lock().unwrap();
        let rows = &state.pages[state.current].rows;
        match ordinal.checked_sub(1).and_then(|i| rows.get(i)) {
            Some(cells) => RowProbe::Found(Box::new(MockRow {
                cells: cells.clone(),
            })),
            None => RowProbe::Boundary,
        }
    }

    async fn find_element(&self, selector: &str) -> Result<Box<dyn ElementHandle>, DriverError> {
        if selector != NEXT_LOCATOR {
            return Err(DriverError::NotFound(selector.to_string()));
        }
        let enabled = {
            let state = self.state.lock().unwrap();
            match state.pages[state.current].next_control {
                Some(enabled) => enabled,
                None => return Err(DriverError::NotFound(selector.to_string())),
            }
        };
        Ok(Box::new(MockNextControl {
            state: self.state.clone(),
            enabled,
        }))
    }

    async fn ready_state(&self) -> Result<String, DriverError> {
        Ok("complete".to_string())
    }

    async fn pending_requests(&self) -> Result<i64, DriverError> {
        Ok(0)
    }

    async fn scroll_by(&self, _pixels: i64) -> Result<(), DriverError> {
        Ok(())
    }

    async fn wait_until_visible(
        &self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        Ok(())
    }
}

struct MockNextControl {
    state: Arc<Mutex<ClickState>>,
    enabled: bool,
}

#[async_trait]
impl ElementHandle for MockNextControl {
    async fn is_displayed(&self) -> Result<bool, DriverError> {
        Ok(true)
    }

    async fn is_enabled(&self) -> Result<bool, DriverError> {
        Ok(self.enabled)
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok("Next »".to_string())
    }

    async fn attribute(&self, _name: &str) -> Result<Option<String>, DriverError> {
        Ok(None)
    }

    async fn click(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.clicks += 1;
        if state.broken_clicks {
            return Err(DriverError::Interaction("element not interactable".into()));
        }
        if state.current + 1 < state.pages.len() {
            state.current += 1;
        }
        // Clicking on the last page re-renders it unchanged.
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn find_child(&self, selector: &str) -> Result<Box<dyn ElementHandle>, DriverError> {
        Err(DriverError::NotFound(selector.to_string()))
    }
}

struct MockRow {
    cells: Vec<String>,
}

#[async_trait]
impl ElementHandle for MockRow {
    async fn is_displayed(&self) -> Result<bool, DriverError> {
        Ok(true)
    }

    async fn is_enabled(&self) -> Result<bool, DriverError> {
        Ok(true)
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.cells.join(" "))
    }

    async fn attribute(&self, _name: &str) -> Result<Option<String>, DriverError> {
        Ok(None)
    }

    async fn click(&self) -> Result<(), DriverError> {
        Err(DriverError::Interaction("rows are not clickable".into()))
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        Ok(())
    }

    /// Cell locators are `"c0"`, `"c1"`, ... indexing into the scripted row.
    async fn find_child(&self, selector: &str) -> Result<Box<dyn ElementHandle>, DriverError> {
        let index: usize = selector
            .strip_prefix('c')
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| DriverError::NotFound(selector.to_string()))?;
        let value = self
            .cells
            .get(index)
            .ok_or_else(|| DriverError::NotFound(selector.to_string()))?;
        Ok(Box::new(MockCell {
            value: value.clone(),
        }))
    }
}

struct MockCell {
    value: String,
}

#[async_trait]
impl ElementHandle for MockCell {
    async fn is_displayed(&self) -> Result<bool, DriverError> {
        Ok(true)
    }

    async fn is_enabled(&self) -> Result<bool, DriverError> {
        Ok(true)
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.value.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        if name == "data-value" {
            Ok(Some(self.value.clone()))
        } else {
            Ok(None)
        }
    }

    async fn click(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn find_child(&self, selector: &str) -> Result<Box<dyn ElementHandle>, DriverError> {
        Err(DriverError::NotFound(selector.to_string()))
    }
}

/// Infinite-scroll driver: rows are revealed in chunks per scroll, and
/// scrolling past the end reveals nothing new.
struct ScrollDriver {
    rows: Vec<Vec<String>>,
    revealed: Mutex<usize>,
    chunk: usize,
}

#[async_trait]
impl PageDriver for ScrollDriver {
    async fn probe_row(&self, _selector: &str, ordinal: usize) -> RowProbe {
        let revealed = *self.revealed.lock().unwrap();
        match ordinal.checked_sub(1).filter(|i| *i < revealed) {
            Some(i) => RowProbe::Found(Box::new(MockRow {
                cells: self.rows[i].clone(),
            })),
            None => RowProbe::Boundary,
        }
    }

    async fn find_element(&self, selector: &str) -> Result<Box<dyn ElementHandle>, DriverError> {
        Err(DriverError::NotFound(selector.to_string()))
    }

    async fn ready_state(&self) -> Result<String, DriverError> {
        Ok("complete".to_string())
    }

    async fn pending_requests(&self) -> Result<i64, DriverError> {
        Ok(0)
    }

    async fn scroll_by(&self, _pixels: i64) -> Result<(), DriverError> {
        let mut revealed = self.revealed.lock().unwrap();
        *revealed = (*revealed + self.chunk).min(self.rows.len());
        Ok(())
    }

    async fn wait_until_visible(
        &self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        Ok(())
    }
}

fn schema(columns: usize) -> TableSchema {
    let mut schema = TableSchema::new(ROW_LOCATOR);
    for i in 0..columns {
        schema
            .add_column(format!("c{i}"), format!("Col{i}"), "text")
            .unwrap();
    }
    schema
}

const WAIT: Duration = Duration::from_secs(1);

#[tokio::test]
async fn single_page_stops_at_first_missing_row() {
    let driver = Arc::new(ClickDriver::new(vec![page(
        &[&["a", "1"], &["b", "2"]],
        None,
    )]));
    let scraper = TableScraper::new(driver.clone(), schema(2), PaginationConfig::single_page());

    let result = scraper.scrape(0, WAIT).await.unwrap();
    assert_eq!(result.header().to_vec(), vec!["Col0", "Col1"]);
    assert_eq!(result.records().len(), 2);
    assert_eq!(result.records()[1], vec!["b", "2"]);
    assert_eq!(driver.clicks(), 0);
}

#[tokio::test]
async fn empty_second_page_with_disabled_next_keeps_all_rows() {
    // Page 1 has 3 rows and an enabled next control; page 2 is empty with the
    // control disabled. The empty trailing batch is not a duplicate, so
    // nothing is reverted.
    let driver = Arc::new(ClickDriver::new(vec![
        page(&[&["a", "1"], &["b", "2"], &["c", "3"]], Some(true)),
        page(&[], Some(false)),
    ]));
    let scraper = TableScraper::new(
        driver.clone(),
        schema(2),
        PaginationConfig::next_control(NEXT_LOCATOR).unwrap(),
    );

    let result = scraper.scrape(0, WAIT).await.unwrap();
    assert_eq!(result.records().len(), 3);
    assert_eq!(driver.clicks(), 1);
}

#[tokio::test]
async fn duplicate_second_page_is_reverted() {
    // The next control stays enabled but the click re-renders identical
    // content; the duplicate batch must be excluded from the result.
    let rows: &[&[&str]] = &[&["a", "1"], &["b", "2"]];
    let driver = Arc::new(ClickDriver::new(vec![
        page(rows, Some(true)),
        page(rows, Some(true)),
    ]));
    let scraper = TableScraper::new(
        driver.clone(),
        schema(2),
        PaginationConfig::next_control(NEXT_LOCATOR).unwrap(),
    );

    let result = scraper.scrape(0, WAIT).await.unwrap();
    assert_eq!(result.records().len(), 2);
    assert_eq!(result.records()[0], vec!["a", "1"]);
    assert_eq!(result.records()[1], vec!["b", "2"]);
    // One click reached page 2, the second click went nowhere.
    assert_eq!(driver.clicks(), 2);
}

#[tokio::test]
async fn disabled_next_over_duplicate_page_is_reverted() {
    // The click lands on a page with the same rows and a disabled next
    // control: the site looped back to content already collected, so the
    // trailing duplicate batch is dropped.
    let rows: &[&[&str]] = &[&["a", "1"], &["b", "2"]];
    let driver = Arc::new(ClickDriver::new(vec![
        page(rows, Some(true)),
        page(rows, Some(false)),
    ]));
    let scraper = TableScraper::new(
        driver.clone(),
        schema(2),
        PaginationConfig::next_control(NEXT_LOCATOR).unwrap(),
    );

    let result = scraper.scrape(0, WAIT).await.unwrap();
    assert_eq!(result.records().len(), 2);
    assert_eq!(result.records()[0], vec!["a", "1"]);
    assert_eq!(result.records()[1], vec!["b", "2"]);
    assert_eq!(driver.clicks(), 1);
}

#[tokio::test]
async fn failed_next_click_keeps_collected_rows() {
    // A click that errors out ends the walk without discarding what was
    // already collected.
    let driver = Arc::new(ClickDriver::with_broken_clicks(vec![
        page(&[&["a", "1"], &["b", "2"]], Some(true)),
        page(&[&["c", "3"]], Some(false)),
    ]));
    let scraper = TableScraper::new(
        driver.clone(),
        schema(2),
        PaginationConfig::next_control(NEXT_LOCATOR).unwrap(),
    );

    let result = scraper.scrape(0, WAIT).await.unwrap();
    assert_eq!(result.records().len(), 2);
    assert_eq!(result.records()[1], vec!["b", "2"]);
    // The click was attempted once and never retried.
    assert_eq!(driver.clicks(), 1);
}

#[tokio::test]
async fn multi_page_walk_accumulates_in_traversal_order() {
    let driver = Arc::new(ClickDriver::new(vec![
        page(&[&["a", "1"], &["b", "2"]], Some(true)),
        page(&[&["c", "3"], &["d", "4"]], Some(true)),
        page(&[&["e", "5"]], Some(false)),
    ]));
    let scraper = TableScraper::new(
        driver,
        schema(2),
        PaginationConfig::next_control(NEXT_LOCATOR).unwrap(),
    );

    let result = scraper.scrape(0, WAIT).await.unwrap();
    let first_column: Vec<&str> = result.records().iter().map(|r| r[0].as_str()).collect();
    assert_eq!(first_column, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn target_row_count_bounds_the_walk() {
    let driver = Arc::new(ClickDriver::new(vec![page(
        &[&["a", "1"], &["b", "2"], &["c", "3"], &["d", "4"], &["e", "5"]],
        None,
    )]));
    let scraper = TableScraper::new(driver, schema(2), PaginationConfig::single_page());

    let result = scraper.scrape(3, WAIT).await.unwrap();
    assert_eq!(result.records().len(), 3);
}

#[tokio::test]
async fn missing_cells_resolve_to_empty_fields() {
    // The second row only has one cell; the schema wants three, one of them
    // an attribute read. Every record still has exactly schema-many fields.
    let driver = Arc::new(ClickDriver::new(vec![page(
        &[&["a", "1", "x"], &["b"]],
        None,
    )]));
    let mut schema = TableSchema::new(ROW_LOCATOR);
    schema
        .add_column("c0", "Name", "text")
        .unwrap()
        .add_column("c1", "Value", "data-value")
        .unwrap()
        .add_column("c2", "Extra", "missing-attr")
        .unwrap();
    let scraper = TableScraper::new(driver, schema, PaginationConfig::single_page());

    let result = scraper.scrape(0, WAIT).await.unwrap();
    assert_eq!(result.records().len(), 2);
    // Attribute read resolves, unknown attribute and missing cell blank out.
    assert_eq!(result.records()[0], vec!["a", "1", ""]);
    assert_eq!(result.records()[1], vec!["b", "", ""]);
}

#[tokio::test]
async fn scroll_pagination_reveals_chunks_and_terminates() {
    let driver = Arc::new(ScrollDriver {
        rows: (1..=6).map(|i| vec![format!("row{i}")]).collect(),
        revealed: Mutex::new(3),
        chunk: 3,
    });
    let scraper = TableScraper::new(driver, schema(1), PaginationConfig::scrolling(400, 1));

    let result = scraper.scrape(0, WAIT).await.unwrap();
    let names: Vec<&str> = result.records().iter().map(|r| r[0].as_str()).collect();
    assert_eq!(names, vec!["row1", "row2", "row3", "row4", "row5", "row6"]);
}

#[tokio::test]
async fn normalized_result_round_trips_through_serialization() {
    let driver = Arc::new(ClickDriver::new(vec![page(
        &[
            &["Film A", "7.4 / 10", "Director: Jane Doe | Actor"],
            &["Film B", "8.1 / 10", "Stars: A, B | C"],
            &["", "", ""],
        ],
        None,
    )]));
    let scraper = TableScraper::new(driver, schema(3), PaginationConfig::single_page());

    let mut result = scraper.scrape(0, WAIT).await.unwrap();
    Normalizer::new()
        .rule(1, FieldRule::DigitsOnly)
        .rule(
            2,
            FieldRule::LabeledValue {
                keep: "Director".to_string(),
                reject: "Stars".to_string(),
            },
        )
        .apply(&mut result);

    // Placeholder record dropped, rules applied in place.
    assert_eq!(result.records().len(), 2);
    assert_eq!(result.records()[0], vec!["Film A", "74", "Jane Doe"]);
    assert_eq!(result.records()[1], vec!["Film B", "81", ""]);

    let json = result.to_json().unwrap();
    assert_eq!(json, result.to_json().unwrap());
    assert!(json.starts_with(r#"[["Col0","Col1","Col2"]"#));
}

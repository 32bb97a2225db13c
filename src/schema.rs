//! Column schema and pagination configuration
//!
//! A [`TableSchema`] describes what to pull out of each row: an ordered list
//! of column definitions rooted at a row locator. Column order is output
//! order. A [`PaginationConfig`] describes how to advance past the current
//! visible row set: click a next control, scroll, or neither (single page).

use crate::error::ScrapeError;

/// Sentinel attribute name meaning "read the rendered text content".
pub const TEXT_ATTRIBUTE: &str = "text";

/// One (label, locator, attribute) column rule, immutable once added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Header label emitted for this column.
    pub label: String,
    /// Selector resolved relative to the row element.
    pub locator: String,
    /// DOM attribute to read, or [`TEXT_ATTRIBUTE`] for rendered text.
    pub attribute: String,
}

impl ColumnDefinition {
    /// Whether this column reads rendered text rather than a named attribute.
    pub fn is_text(&self) -> bool {
        self.attribute.eq_ignore_ascii_case(TEXT_ATTRIBUTE)
    }
}

/// Ordered column schema rooted at a row locator.
///
/// Labels are not deduplicated; colliding labels produce ambiguous output and
/// are the caller's responsibility to avoid.
#[derive(Debug, Clone)]
pub struct TableSchema {
    row_locator: String,
    columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    /// Start a fresh schema rooted at `row_locator`, the selector matching
    /// each table row. Any previously accumulated columns are discarded.
    pub fn new(row_locator: impl Into<String>) -> Self {
        Self {
            row_locator: row_locator.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column. Call order defines output column order.
    pub fn add_column(
        &mut self,
        locator: impl Into<String>,
        label: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Result<&mut Self, ScrapeError> {
        let label = label.into();
        let attribute = attribute.into();

        if label.trim().is_empty() {
            return Err(ScrapeError::InvalidColumnSpec(
                "column label must not be empty".to_string(),
            ));
        }
        if attribute.trim().is_empty() {
            return Err(ScrapeError::InvalidColumnSpec(format!(
                "column '{}' has an empty attribute name",
                label
            )));
        }

        self.columns.push(ColumnDefinition {
            label,
            locator: locator.into(),
            attribute,
        });
        Ok(self)
    }

    /// Append a column from `"Label::attribute"` metadata.
    pub fn add_column_spec(
        &mut self,
        locator: impl Into<String>,
        metadata: &str,
    ) -> Result<&mut Self, ScrapeError> {
        let mut parts = metadata.split("::");
        match (parts.next(), parts.next(), parts.next()) {
            (Some(label), Some(attribute), None) => self.add_column(locator, label, attribute),
            _ => Err(ScrapeError::InvalidColumnSpec(format!(
                "invalid column metadata '{}', expected 'Label::attribute'",
                metadata
            ))),
        }
    }

    pub fn row_locator(&self) -> &str {
        &self.row_locator
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Header row: the column labels in schema order.
    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }
}

/// How to advance past the current visible row set.
///
/// Exactly one mode is meaningful at a time: click-based (next control set),
/// scroll-based, or single fixed page.
#[derive(Debug, Clone, Default)]
pub struct PaginationConfig {
    next_control: Option<String>,
    scroll_enabled: bool,
    scroll_step_pixels: u32,
    scroll_reset_count: u32,
}

impl PaginationConfig {
    /// Fixed single page: the first missing row ends the traversal.
    pub fn single_page() -> Self {
        Self::default()
    }

    /// Click-based pagination via a "next" control.
    pub fn next_control(locator: impl Into<String>) -> Result<Self, ScrapeError> {
        let locator = locator.into();
        if locator.trim().is_empty() {
            return Err(ScrapeError::InvalidPaginationSpec(
                "next-control locator must not be empty".to_string(),
            ));
        }
        Ok(Self {
            next_control: Some(locator),
            ..Self::default()
        })
    }

    /// Scroll-based virtual pagination: scroll by `step_pixels` on each page
    /// boundary and rewind the probe index by `reset_count` afterwards.
    pub fn scrolling(step_pixels: u32, reset_count: u32) -> Self {
        Self {
            next_control: None,
            scroll_enabled: true,
            scroll_step_pixels: step_pixels,
            scroll_reset_count: reset_count,
        }
    }

    pub fn next_control_locator(&self) -> Option<&str> {
        self.next_control.as_deref()
    }

    pub fn scroll_enabled(&self) -> bool {
        self.scroll_enabled
    }

    pub fn scroll_step_pixels(&self) -> u32 {
        self.scroll_step_pixels
    }

    pub fn scroll_reset_count(&self) -> u32 {
        self.scroll_reset_count
    }
}

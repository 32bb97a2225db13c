//! The DOM automation capability consumed by the traversal engine
//!
//! The engine never talks to chromiumoxide directly: it holds a
//! [`PageDriver`] and drives element lookup, script probes, scrolling, and
//! clicks through it. This keeps the engine testable against a scripted
//! in-memory driver and pins down exactly which browser operations the
//! scraper depends on.

mod cdp;

pub use cdp::CdpDriver;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a [`PageDriver`] implementation.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Interaction failed: {0}")]
    Interaction(String),
}

/// Outcome of probing the visible row set at a given ordinal.
///
/// A missing row is a normal page boundary, not a fault, so the probe returns
/// a tagged value instead of an error.
pub enum RowProbe {
    Found(Box<dyn ElementHandle>),
    Boundary,
}

/// Handle to one live DOM element.
///
/// Handles are consumed promptly: the engine reads a row's fields and drops
/// the handle before the next pagination step can invalidate it.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Whether the element is rendered with a visible box.
    async fn is_displayed(&self) -> Result<bool, DriverError>;

    /// Whether the element accepts interaction (not disabled).
    async fn is_enabled(&self) -> Result<bool, DriverError>;

    /// Rendered text content.
    async fn text(&self) -> Result<String, DriverError>;

    /// Named DOM attribute, `None` when absent.
    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError>;

    /// Click the element.
    async fn click(&self) -> Result<(), DriverError>;

    /// Best-effort scroll so the element is inside the viewport.
    async fn scroll_into_view(&self) -> Result<(), DriverError>;

    /// Locate a descendant relative to this element.
    async fn find_child(&self, selector: &str) -> Result<Box<dyn ElementHandle>, DriverError>;
}

/// Minimal page-level capability required by the scraper.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Probe for the `ordinal`-th (1-based) element matching `selector`
    /// within the current visible set. Lookup failures count as a boundary.
    async fn probe_row(&self, selector: &str, ordinal: usize) -> RowProbe;

    /// Locate a single element anywhere on the page.
    async fn find_element(&self, selector: &str) -> Result<Box<dyn ElementHandle>, DriverError>;

    /// `document.readyState` of the current document.
    async fn ready_state(&self) -> Result<String, DriverError>;

    /// Count of known pending asynchronous requests, 0 when the page exposes
    /// no such counter.
    async fn pending_requests(&self) -> Result<i64, DriverError>;

    /// Scroll the window vertically by `pixels`.
    async fn scroll_by(&self, pixels: i64) -> Result<(), DriverError>;

    /// Poll until an element matching `selector` is present and displayed,
    /// failing with [`DriverError::NotFound`] once `timeout` elapses.
    async fn wait_until_visible(&self, selector: &str, timeout: Duration)
    -> Result<(), DriverError>;
}

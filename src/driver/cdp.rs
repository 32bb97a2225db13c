//! chromiumoxide-backed [`PageDriver`] implementation

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::element::Element;
use chromiumoxide_cdp::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams};
use serde_json::json;
use tracing::trace;

use super::{DriverError, ElementHandle, PageDriver, RowProbe};

/// Visibility check evaluated against a bound element.
const IS_DISPLAYED_FN: &str = "function() { \
     const rect = this.getBoundingClientRect(); \
     const style = window.getComputedStyle(this); \
     return rect.width > 0 && rect.height > 0 \
         && style.visibility !== 'hidden' && style.display !== 'none'; \
 }";

/// Enabled check: the DOM `disabled` flag plus the aria equivalent some
/// pagination widgets use instead.
const IS_ENABLED_FN: &str = "function() { \
     return !this.disabled && this.getAttribute('aria-disabled') !== 'true'; \
 }";

/// Pending-async-request probe. jQuery sites expose an in-flight counter;
/// everything else reports 0 and quiescence falls back to readyState alone.
const PENDING_REQUESTS_JS: &str = "typeof jQuery === 'undefined' ? 0 : jQuery.active";

/// [`PageDriver`] over a chromiumoxide CDP session.
///
/// Owns nothing beyond the `Page` handle; the browser process lifecycle is
/// managed by [`crate::BrowserWrapper`].
pub struct CdpDriver {
    page: Page,
}

impl CdpDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn probe_row(&self, selector: &str, ordinal: usize) -> RowProbe {
        let Some(index) = ordinal.checked_sub(1) else {
            return RowProbe::Boundary;
        };

        match self.page.find_elements(selector).await {
            Ok(elements) => match elements.into_iter().nth(index) {
                Some(element) => RowProbe::Found(Box::new(CdpElement {
                    element,
                    page: self.page.clone(),
                })),
                None => RowProbe::Boundary,
            },
            Err(e) => {
                trace!(selector, ordinal, error = %e, "row probe lookup failed");
                RowProbe::Boundary
            }
        }
    }

    async fn find_element(&self, selector: &str) -> Result<Box<dyn ElementHandle>, DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| DriverError::NotFound(format!("'{}': {}", selector, e)))?;
        Ok(Box::new(CdpElement {
            element,
            page: self.page.clone(),
        }))
    }

    async fn ready_state(&self) -> Result<String, DriverError> {
        self.page
            .evaluate("document.readyState")
            .await
            .map_err(|e| DriverError::Script(format!("readyState probe: {}", e)))?
            .into_value::<String>()
            .map_err(|e| DriverError::Script(format!("readyState result: {}", e)))
    }

    async fn pending_requests(&self) -> Result<i64, DriverError> {
        self.page
            .evaluate(PENDING_REQUESTS_JS)
            .await
            .map_err(|e| DriverError::Script(format!("pending-request probe: {}", e)))?
            .into_value::<i64>()
            .map_err(|e| DriverError::Script(format!("pending-request result: {}", e)))
    }

    async fn scroll_by(&self, pixels: i64) -> Result<(), DriverError> {
        // Parameterized evaluation prevents injection
        let call = CallFunctionOnParams::builder()
            .function_declaration("(y) => window.scrollBy(0, y)")
            .argument(CallArgument::builder().value(json!(pixels)).build())
            .build()
            .map_err(|e| DriverError::Script(format!("failed to build scroll params: {}", e)))?;

        self.page
            .evaluate_function(call)
            .await
            .map_err(|e| DriverError::Script(format!("scrollBy({}) failed: {}", pixels, e)))?;
        Ok(())
    }

    async fn wait_until_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let start = std::time::Instant::now();
        let mut poll_interval = Duration::from_millis(100);
        let max_interval = Duration::from_secs(1);

        loop {
            if let Ok(element) = self.find_element(selector).await
                && element.is_displayed().await.unwrap_or(false)
            {
                return Ok(());
            }

            if start.elapsed() >= timeout {
                return Err(DriverError::NotFound(format!(
                    "'{}' not visible after {}ms",
                    selector,
                    timeout.as_millis()
                )));
            }

            tokio::time::sleep(poll_interval).await;

            // Exponential backoff, capped
            poll_interval = (poll_interval * 2).min(max_interval);
        }
    }
}

struct CdpElement {
    element: Element,
    page: Page,
}

impl CdpElement {
    /// Run a bound element function and deserialize its return value.
    async fn eval_on_self<T: serde::de::DeserializeOwned>(
        &self,
        function: &str,
    ) -> Result<T, DriverError> {
        let returns = self
            .element
            .call_js_fn(function, false)
            .await
            .map_err(|e| DriverError::Script(format!("element probe: {}", e)))?;
        let value = returns
            .result
            .value
            .ok_or_else(|| DriverError::Script("element probe returned no value".to_string()))?;
        serde_json::from_value(value)
            .map_err(|e| DriverError::Script(format!("element probe result: {}", e)))
    }
}

#[async_trait]
impl ElementHandle for CdpElement {
    async fn is_displayed(&self) -> Result<bool, DriverError> {
        self.eval_on_self(IS_DISPLAYED_FN).await
    }

    async fn is_enabled(&self) -> Result<bool, DriverError> {
        self.eval_on_self(IS_ENABLED_FN).await
    }

    async fn text(&self) -> Result<String, DriverError> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(|e| DriverError::Interaction(format!("text read failed: {}", e)))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| DriverError::Interaction(format!("attribute '{}' read failed: {}", name, e)))
    }

    async fn click(&self) -> Result<(), DriverError> {
        // Clickable point + page click bypasses the IntersectionObserver hang
        // seen with Element::click on virtualized lists.
        self.element
            .scroll_into_view()
            .await
            .map_err(|e| DriverError::Interaction(format!("scroll before click failed: {}", e)))?;

        let point = self
            .element
            .clickable_point()
            .await
            .map_err(|e| DriverError::Interaction(format!("no clickable point: {}", e)))?;

        self.page
            .click(point)
            .await
            .map_err(|e| DriverError::Interaction(format!("click failed: {}", e)))?;
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        self.element
            .scroll_into_view()
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Interaction(format!("scroll into view failed: {}", e)))
    }

    async fn find_child(&self, selector: &str) -> Result<Box<dyn ElementHandle>, DriverError> {
        let element = self
            .element
            .find_element(selector)
            .await
            .map_err(|e| DriverError::NotFound(format!("child '{}': {}", selector, e)))?;
        Ok(Box::new(CdpElement {
            element,
            page: self.page.clone(),
        }))
    }
}

//! Headless Chromium rendering with an in-page pagination pass.
//!
//! The renderer walks one page through
//! `Idle -> HtmlLoaded -> Measured -> Rendered -> Closed`. Before printing, a
//! script measures the content and stretches `.page-container` to a whole
//! number of pages so the bottom-pinned salesperson block lands at the foot
//! of the last page. The browser process is closed on every exit path.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Pixels per millimetre at 96 dpi, used when the 1mm probe reports nothing.
pub const FALLBACK_PX_PER_MM: f64 = 3.78;

const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;
/// 20 CSS pixels at 96 px per inch.
const SIDE_MARGIN_IN: f64 = 20.0 / 96.0;

/// Ratios this close to a whole number count as that number, so a content
/// height that is an exact multiple of the page never gains a page from
/// floating point noise.
const PAGE_RATIO_EPSILON: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to configure browser: {0}")]
    Config(String),
    #[error("failed to launch browser: {0}")]
    Launch(#[source] chromiumoxide::error::CdpError),
    #[error("renderer failed while {stage}: {source}")]
    Stage {
        stage: RenderStage,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Idle,
    HtmlLoaded,
    Measured,
    Rendered,
    Closed,
}

impl fmt::Display for RenderStage {
    /// Describes the work done to leave this stage.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "loading html",
            Self::HtmlLoaded => "measuring pages",
            Self::Measured => "printing pdf",
            Self::Rendered => "closing",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Number of fixed-height pages needed for `scroll_height_px` of content.
///
/// Always at least one page.
pub fn pages_needed(scroll_height_px: f64, page_height_mm: f64, px_per_mm: f64) -> u32 {
    let px_per_mm = effective_px_per_mm(px_per_mm);
    let ratio = scroll_height_px / (page_height_mm * px_per_mm);
    if !ratio.is_finite() || ratio <= 0.0 {
        return 1;
    }
    let nearest = ratio.round();
    let pages = if (ratio - nearest).abs() < PAGE_RATIO_EPSILON {
        nearest
    } else {
        ratio.ceil()
    };
    pages.max(1.0) as u32
}

/// Measured px/mm, or [`FALLBACK_PX_PER_MM`] when the 1mm probe had no height.
pub fn effective_px_per_mm(probe_px: f64) -> f64 {
    if probe_px.is_finite() && probe_px > 0.0 {
        probe_px
    } else {
        FALLBACK_PX_PER_MM
    }
}

/// Content height and pixel density reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PageMeasurement {
    #[serde(rename = "scrollHeight")]
    pub scroll_height_px: f64,
    #[serde(rename = "pxPerMM")]
    pub px_per_mm: f64,
}

/// In-page scripts that measure the content container and stretch it to
/// whole pages.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementScript {
    pub page_height_mm: f64,
    pub container_selector: String,
}

impl MeasurementScript {
    pub fn new(page_height_mm: f64) -> Self {
        Self {
            page_height_mm,
            container_selector: ".page-container".to_string(),
        }
    }

    /// Evaluates to `{scrollHeight, pxPerMM}`, or `null` when the container
    /// is missing. `pxPerMM` is 0 when the 1mm probe has no height.
    pub fn measure_source(&self) -> String {
        format!(
            r#"(() => {{
  const container = document.querySelector({selector:?});
  if (!container) return null;
  const probe = document.createElement("div");
  probe.style.height = "1mm";
  document.body.appendChild(probe);
  const pxPerMM = probe.getBoundingClientRect().height;
  document.body.removeChild(probe);
  return {{ scrollHeight: container.scrollHeight, pxPerMM }};
}})()"#,
            selector = self.container_selector,
        )
    }

    /// Pages the measured content occupies.
    pub fn page_count(&self, measurement: &PageMeasurement) -> u32 {
        pages_needed(measurement.scroll_height_px, self.page_height_mm, measurement.px_per_mm)
    }

    /// Sets the container's minimum height to `pages` whole pages.
    pub fn stretch_source(&self, pages: u32) -> String {
        format!(
            r#"(() => {{
  const container = document.querySelector({selector:?});
  if (container) container.style.minHeight = "{height}mm";
  return true;
}})()"#,
            selector = self.container_selector,
            height = f64::from(pages) * self.page_height_mm,
        )
    }
}

/// Script resolving once the document and its images have finished loading.
const WAIT_FOR_LOAD: &str = r#"new Promise((resolve) => {
  if (document.readyState === "complete") { resolve(true); return; }
  window.addEventListener("load", () => resolve(true), { once: true });
})"#;

/// Evaluate `source` as a plain expression, awaiting promises and returning
/// by value.
fn expression(source: impl Into<String>) -> EvaluateParams {
    let mut params = EvaluateParams::new(source);
    params.await_promise = Some(true);
    params.return_by_value = Some(true);
    params
}

/// Turns composed HTML into PDF bytes.
#[async_trait]
pub trait PdfRenderer {
    async fn render(&self, html: &str, script: &MeasurementScript) -> Result<Vec<u8>, RenderError>;
}

/// A4 print settings: backgrounds on, 20px margins except a zero bottom
/// margin, leaving bottom spacing to the stretched container.
pub fn a4_print_params() -> PrintToPdfParams {
    PrintToPdfParams {
        print_background: Some(true),
        paper_width: Some(A4_WIDTH_IN),
        paper_height: Some(A4_HEIGHT_IN),
        margin_top: Some(SIDE_MARGIN_IN),
        margin_bottom: Some(0.0),
        margin_left: Some(SIDE_MARGIN_IN),
        margin_right: Some(SIDE_MARGIN_IN),
        ..Default::default()
    }
}

/// Launches a fresh headless Chromium for every render.
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    request_timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(executable: Option<PathBuf>, request_timeout: Duration) -> Self {
        Self {
            executable,
            request_timeout,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.request_timeout);
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(RenderError::Config)
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render(&self, html: &str, script: &MeasurementScript) -> Result<Vec<u8>, RenderError> {
        let mut session = RenderSession::launch(self.browser_config()?).await?;
        let result = session.run(html, script).await;
        session.close().await;
        result
    }
}

/// One browser process and its event loop.
struct RenderSession {
    browser: Browser,
    handler: JoinHandle<()>,
    stage: RenderStage,
}

impl RenderSession {
    async fn launch(config: BrowserConfig) -> Result<Self, RenderError> {
        let (browser, mut handler) = Browser::launch(config).await.map_err(RenderError::Launch)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            stage: RenderStage::Idle,
        })
    }

    fn advance(&mut self, next: RenderStage) {
        log::debug!("Render stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn failed(&self, source: chromiumoxide::error::CdpError) -> RenderError {
        RenderError::Stage {
            stage: self.stage,
            source,
        }
    }

    async fn run(&mut self, html: &str, script: &MeasurementScript) -> Result<Vec<u8>, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| self.failed(e))?;

        self.load(&page, html).await?;
        self.advance(RenderStage::HtmlLoaded);

        self.paginate(&page, script).await?;
        self.advance(RenderStage::Measured);

        let pdf = page
            .pdf(a4_print_params())
            .await
            .map_err(|e| self.failed(e))?;
        self.advance(RenderStage::Rendered);

        Ok(pdf)
    }

    async fn paginate(&self, page: &Page, script: &MeasurementScript) -> Result<(), RenderError> {
        let measurement = page
            .evaluate_expression(expression(script.measure_source()))
            .await
            .map_err(|e| self.failed(e))?
            .into_value::<Option<PageMeasurement>>();

        let measurement = match measurement {
            Ok(Some(measurement)) => measurement,
            Ok(None) => {
                log::warn!("No {} in document, skipping pagination", script.container_selector);
                return Ok(());
            }
            Err(e) => {
                log::warn!("Unreadable page measurement, skipping pagination: {}", e);
                return Ok(());
            }
        };

        let pages = script.page_count(&measurement);
        log::debug!("Content spans {} page(s)", pages);
        page.evaluate_expression(expression(script.stretch_source(pages)))
            .await
            .map_err(|e| self.failed(e))?;
        Ok(())
    }

    async fn load(&self, page: &Page, html: &str) -> Result<(), RenderError> {
        page.set_content(html).await.map_err(|e| self.failed(e))?;
        page.evaluate_expression(expression(WAIT_FOR_LOAD)).await.map_err(|e| self.failed(e))?;
        Ok(())
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            log::warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            log::warn!("Failed to reap browser process: {}", e);
        }
        self.handler.abort();
        self.advance(RenderStage::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple_does_not_round_up() {
        let px_per_mm = 3.7795275591;
        for page_height in [280.0, 296.0] {
            let height = 3.0 * page_height * px_per_mm;
            assert_eq!(pages_needed(height, page_height, px_per_mm), 3);
        }
        assert_eq!(pages_needed(3.0 * 280.0 * 3.78, 280.0, 3.78), 3);
    }

    #[test]
    fn test_partial_page_rounds_up() {
        let page_px = 280.0 * 3.78;
        assert_eq!(pages_needed(page_px + 1.0, 280.0, 3.78), 2);
        assert_eq!(pages_needed(page_px * 0.5, 280.0, 3.78), 1);
    }

    #[test]
    fn test_empty_content_is_one_page() {
        assert_eq!(pages_needed(0.0, 280.0, 3.78), 1);
    }

    #[test]
    fn test_zero_probe_uses_fallback() {
        assert_eq!(effective_px_per_mm(0.0), FALLBACK_PX_PER_MM);
        assert_eq!(effective_px_per_mm(4.0), 4.0);
        let height = 2.0 * 296.0 * FALLBACK_PX_PER_MM;
        assert_eq!(pages_needed(height, 296.0, 0.0), 2);
    }

    #[test]
    fn test_measurement_matches_script_shape() {
        let source = MeasurementScript::new(280.0).measure_source();
        assert!(source.contains("document.querySelector(\".page-container\")"));
        assert!(source.contains("return { scrollHeight: container.scrollHeight, pxPerMM };"));

        let measurement: PageMeasurement =
            serde_json::from_str(r#"{"scrollHeight": 3175.2, "pxPerMM": 3.78}"#).unwrap();
        assert_eq!(measurement.scroll_height_px, 3175.2);
        assert_eq!(measurement.px_per_mm, 3.78);

        let missing: Option<PageMeasurement> = serde_json::from_str("null").unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_page_count_on_exact_and_partial_heights() {
        let script = MeasurementScript::new(296.0);
        let px_per_mm = 3.7795275591;
        let exact = PageMeasurement {
            scroll_height_px: 3.0 * 296.0 * px_per_mm,
            px_per_mm,
        };
        assert_eq!(script.page_count(&exact), 3);

        let partial = PageMeasurement {
            scroll_height_px: exact.scroll_height_px + 1.0,
            px_per_mm,
        };
        assert_eq!(script.page_count(&partial), 4);

        let no_probe = PageMeasurement {
            scroll_height_px: 2.0 * 296.0 * FALLBACK_PX_PER_MM,
            px_per_mm: 0.0,
        };
        assert_eq!(script.page_count(&no_probe), 2);
    }

    #[test]
    fn test_stretch_sets_whole_page_height() {
        let source = MeasurementScript::new(280.0).stretch_source(3);
        assert!(source.contains("container.style.minHeight = \"840mm\""));
        let source = MeasurementScript::new(296.0).stretch_source(1);
        assert!(source.contains("\"296mm\""));
    }

    #[test]
    fn test_print_params_are_a4_without_bottom_margin() {
        let params = a4_print_params();
        assert_eq!(params.print_background, Some(true));
        assert_eq!(params.paper_width, Some(8.27));
        assert_eq!(params.paper_height, Some(11.69));
        assert_eq!(params.margin_bottom, Some(0.0));
        assert_eq!(params.margin_top, params.margin_left);
    }

    #[test]
    fn test_expression_awaits_and_returns_by_value() {
        let params = expression(WAIT_FOR_LOAD);
        assert_eq!(params.await_promise, Some(true));
        assert_eq!(params.return_by_value, Some(true));
        assert!(params.expression.starts_with("new Promise"));
    }
}

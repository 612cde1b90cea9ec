//! CDP browse session
//!
//! Browser lifecycle plus the page-level anomaly listeners. Exceptions,
//! console errors, and failed HTTP responses are buffered as they arrive
//! and drained exactly once per observation.

use crate::browser::config::BrowserConfig;
use crate::browser::elements;
use crate::error::{ActionError, BrowserError, Error, Result};
use crate::session::{ActionKind, BrowseSession};
use crate::state::{Element, ErrorRecord};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::cdp::js_protocol::runtime;
use chromiumoxide::Page;
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// A live browser session positioned on one page
pub struct CdpSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    errors: Arc<Mutex<Vec<ErrorRecord>>>,
    listeners: Vec<JoinHandle<()>>,
    config: BrowserConfig,
}

impl CdpSession {
    /// Launch a browser and establish a session positioned at `start_url`.
    ///
    /// Fails with [`BrowserError::InitFailed`] if the session cannot be
    /// created or the initial navigation fails.
    #[instrument(skip(config))]
    pub async fn initialize(start_url: &str, config: BrowserConfig) -> Result<Self> {
        info!(headless = config.headless, "initializing browse session");

        let mut builder = CdpBrowserConfig::builder();

        builder = builder.viewport(chromiumoxide::handler::viewport::Viewport {
            width: config.width,
            height: config.height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        });

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.arg("--no-sandbox");
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        for arg in &config.extra_args {
            builder = builder.arg(arg);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| BrowserError::ConfigError(e.to_string()))?;

        let (mut browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    warn!("Browser handler event error");
                    break;
                }
            }
            debug!("Browser handler finished");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                return Err(BrowserError::PageCreationFailed(e.to_string()).into());
            }
        };

        // Listeners must be in place before the first navigation so early
        // load errors are captured too.
        let errors = Arc::new(Mutex::new(Vec::new()));
        let listeners = spawn_error_listeners(&page, errors.clone()).await;

        let navigation = tokio::time::timeout(Duration::from_millis(config.timeout_ms), async {
            page.goto(start_url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        })
        .await;

        match navigation {
            Err(_) => {
                let _ = browser.close().await;
                return Err(BrowserError::Timeout(config.timeout_ms).into());
            }
            Ok(Err(e)) => {
                let _ = browser.close().await;
                return Err(BrowserError::InitFailed(e.to_string()).into());
            }
            Ok(Ok(())) => {}
        }

        info!("browse session ready");

        Ok(Self {
            browser,
            handler: handler_task,
            page,
            errors,
            listeners,
            config,
        })
    }
}

async fn page_url(page: &Page) -> String {
    page.url().await.ok().flatten().unwrap_or_default()
}

/// Subscribe to the CDP events that correspond to observable anomalies,
/// buffering them until the next `observe_errors` drain.
async fn spawn_error_listeners(
    page: &Page,
    errors: Arc<Mutex<Vec<ErrorRecord>>>,
) -> Vec<JoinHandle<()>> {
    // Best-effort enables; a failure only means fewer observations
    let _ = page.execute(runtime::EnableParams::default()).await;
    let _ = page.execute(network::EnableParams::default()).await;

    let mut tasks = Vec::new();

    // Unhandled page exceptions
    if let Ok(mut stream) = page.event_listener::<runtime::EventExceptionThrown>().await {
        let page = page.clone();
        let buffer = errors.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let details = &event.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                let url = page_url(&page).await;
                buffer.lock().push(ErrorRecord::page_error(message, url));
            }
        }));
    }

    // console.error output
    if let Ok(mut stream) = page
        .event_listener::<runtime::EventConsoleApiCalled>()
        .await
    {
        let page = page.clone();
        let buffer = errors.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                if event.r#type != runtime::ConsoleApiCalledType::Error {
                    continue;
                }
                let message = event
                    .args
                    .iter()
                    .filter_map(|arg| {
                        arg.value
                            .as_ref()
                            .map(|v| v.to_string())
                            .or_else(|| arg.description.clone())
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                let url = page_url(&page).await;
                buffer.lock().push(ErrorRecord::console_error(message, url));
            }
        }));
    }

    // HTTP 4xx/5xx responses
    if let Ok(mut stream) = page.event_listener::<network::EventResponseReceived>().await {
        let page = page.clone();
        let buffer = errors.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let status = event.response.status;
                if !(400..600).contains(&status) {
                    continue;
                }
                let url = page_url(&page).await;
                buffer.lock().push(ErrorRecord::network_error(
                    status as u16,
                    event.response.url.clone(),
                    url,
                ));
            }
        }));
    }

    tasks
}

#[async_trait]
impl BrowseSession for CdpSession {
    async fn observe_errors(&mut self) -> Vec<ErrorRecord> {
        std::mem::take(&mut *self.errors.lock())
    }

    async fn observe_elements(&mut self) -> Result<Vec<Element>> {
        elements::extract_interactive(&self.page).await
    }

    async fn act(&mut self, selector: &str, kind: ActionKind, value: Option<&str>) -> Result<()> {
        match kind {
            ActionKind::Click => {
                debug!(selector, "clicking");
                let element = self
                    .page
                    .find_element(selector)
                    .await
                    .map_err(|e| ActionError::new(selector, e.to_string()))?;
                element
                    .click()
                    .await
                    .map_err(|e| ActionError::new(selector, e.to_string()))?;
                tokio::time::sleep(Duration::from_millis(self.config.click_settle_ms)).await;
            }
            ActionKind::Fill => {
                debug!(selector, "filling");
                let element = self
                    .page
                    .find_element(selector)
                    .await
                    .map_err(|e| ActionError::new(selector, e.to_string()))?;
                element
                    .click()
                    .await
                    .map_err(|e| ActionError::new(selector, e.to_string()))?;
                element
                    .type_str(value.unwrap_or_default())
                    .await
                    .map_err(|e| ActionError::new(selector, e.to_string()))?;
                tokio::time::sleep(Duration::from_millis(self.config.fill_settle_ms)).await;
            }
        }
        Ok(())
    }

    async fn current_url(&mut self) -> String {
        page_url(&self.page).await
    }

    async fn shutdown(mut self) -> Result<()> {
        info!("closing browse session");

        for task in &self.listeners {
            task.abort();
        }

        self.browser
            .close()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;

        let _ = tokio::time::timeout(Duration::from_secs(5), self.handler).await;

        info!("browse session closed");
        Ok(())
    }
}

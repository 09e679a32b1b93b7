//! `Session` implementation on top of chromiumoxide.

use std::fs;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    ScreenOrientation, ScreenOrientationType, SetDeviceMetricsOverrideParams,
    SetTouchEmulationEnabledParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, GetNavigationHistoryParams, NavigateToHistoryEntryParams,
    StopLoadingParams, Viewport,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::Handler;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commands::{BrowserVersion, ElementRect, QueryAction, QueryProbe, QuerySpec};
use crate::config::CdpConfig;
use crate::devices::DeviceProfile;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::scripts::query_script;
use crate::session::Session;

/// A single Chromium page, either in a browser we launched or in a remote
/// one we attached to.
pub struct ChromiumSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    launched: bool,
    retry_interval: Duration,
}

impl ChromiumSession {
    /// Launch a local browser process.
    pub async fn launch(config: &CdpConfig) -> Result<Self, AdapterError> {
        let browser_config = browser_config(config)?;
        let (browser, handler) = Browser::launch(browser_config).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::LaunchFailed)
                .with_hint(format!("failed to launch chromium: {err}"))
                .with_data(json!({
                    "executable": config.executable,
                    "hint": "Set SOULSCRIPT_CHROME to the full path of chrome/chromium."
                }))
        })?;
        info!(target: "cdp-adapter", headless = config.headless, "chromium launched");
        Self::attach(browser, handler, true, config).await
    }

    /// Attach to a running browser at `url` (`ws://...` or `http://host:port`).
    pub async fn connect(url: &str, config: &CdpConfig) -> Result<Self, AdapterError> {
        let (browser, handler) = Browser::connect(url.to_string()).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::CdpIo)
                .with_hint(format!("failed to connect to {url}: {err}"))
                .retriable(true)
        })?;
        info!(target: "cdp-adapter", url = %url, "chromium connection established");
        Self::attach(browser, handler, false, config).await
    }

    async fn attach(
        browser: Browser,
        mut handler: Handler,
        launched: bool,
        config: &CdpConfig,
    ) -> Result<Self, AdapterError> {
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(target: "cdp-adapter", %err, "handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler.abort();
                return Err(AdapterError::new(AdapterErrorKind::CdpIo)
                    .with_hint(format!("failed to open page: {err}")));
            }
        };

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            launched,
            retry_interval: config.default_retry_interval,
        })
    }

    async fn step_history(&self, delta: i64) -> Result<(), AdapterError> {
        let history = self
            .page
            .execute(GetNavigationHistoryParams::default())
            .await?
            .result;
        let entry = usize::try_from(history.current_index + delta)
            .ok()
            .and_then(|index| history.entries.get(index))
            .ok_or_else(|| {
                AdapterError::new(AdapterErrorKind::Navigation)
                    .with_hint("invalid navigation entry")
            })?;
        self.page
            .execute(NavigateToHistoryEntryParams::new(entry.id))
            .await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn eval_value(&self, script: &str) -> Result<Value, AdapterError> {
        let params = EvaluateParams::builder()
            .expression(script)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))?;
        let result = self.page.evaluate_expression(params).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::ScriptFailed).with_hint(err.to_string())
        })?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    /// Poll the query script until the element satisfies its condition.
    async fn wait_for(
        &self,
        query: &QuerySpec,
        action: QueryAction,
    ) -> Result<QueryProbe, AdapterError> {
        let script = query_script(query, action);
        let interval = query.retry_interval.unwrap_or(self.retry_interval);
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            match self.eval_value(&script).await {
                Ok(value) => {
                    let probe: QueryProbe = serde_json::from_value(value).map_err(|err| {
                        AdapterError::new(AdapterErrorKind::Internal)
                            .with_hint(format!("unexpected query result: {err}"))
                    })?;
                    if probe.ready {
                        debug!(target: "cdp-adapter", query = %query, attempts, count = probe.count, "query satisfied");
                        return Ok(probe);
                    }
                }
                // The page may be between documents while navigating.
                Err(err) => debug!(target: "cdp-adapter", query = %query, %err, "query probe failed"),
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn click_at(&self, rect: ElementRect, clicks: i64) -> Result<(), AdapterError> {
        let (x, y) = rect.center();
        self.dispatch_mouse(DispatchMouseEventType::MouseMoved, x, y, 0)
            .await?;
        for count in 1..=clicks {
            self.dispatch_mouse(DispatchMouseEventType::MousePressed, x, y, count)
                .await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseReleased, x, y, count)
                .await?;
        }
        Ok(())
    }

    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        click_count: i64,
    ) -> Result<(), AdapterError> {
        let mut builder = DispatchMouseEventParams::builder().r#type(kind).x(x).y(y);
        if click_count > 0 {
            builder = builder.button(MouseButton::Left).click_count(click_count);
        }
        let params = builder
            .build()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))?;
        self.page.execute(params).await?;
        Ok(())
    }
}

fn require_rect(probe: QueryProbe, query: &QuerySpec) -> Result<ElementRect, AdapterError> {
    probe.rect.ok_or_else(|| {
        AdapterError::new(AdapterErrorKind::TargetNotFound)
            .with_hint(format!("{query} has no layout box"))
    })
}

#[async_trait]
impl Session for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        self.page.goto(url).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Navigation).with_hint(format!("{url}: {err}"))
        })?;
        Ok(())
    }

    async fn navigate_forward(&self) -> Result<(), AdapterError> {
        self.step_history(1).await
    }

    async fn navigate_back(&self) -> Result<(), AdapterError> {
        self.step_history(-1).await
    }

    async fn reload(&self) -> Result<(), AdapterError> {
        self.page.reload().await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Navigation).with_hint(format!("reload: {err}"))
        })?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), AdapterError> {
        self.page.execute(StopLoadingParams::default()).await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError> {
        self.eval_value(script).await
    }

    async fn title(&self) -> Result<String, AdapterError> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn query_action(
        &self,
        action: QueryAction,
        query: &QuerySpec,
    ) -> Result<(), AdapterError> {
        let probe = self.wait_for(query, action).await?;
        match action {
            QueryAction::Click => self.click_at(require_rect(probe, query)?, 1).await,
            QueryAction::DoubleClick => self.click_at(require_rect(probe, query)?, 2).await,
            // Side effects already ran inside the probe script.
            QueryAction::Blur
            | QueryAction::Clear
            | QueryAction::WaitVisible
            | QueryAction::Screenshot => Ok(()),
        }
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn element_screenshot(
        &self,
        query: &QuerySpec,
        scale: Option<f64>,
    ) -> Result<Vec<u8>, AdapterError> {
        let probe = self.wait_for(query, QueryAction::Screenshot).await?;
        let rect = require_rect(probe, query)?;
        let clip = Viewport {
            x: rect.page_x,
            y: rect.page_y,
            width: rect.width,
            height: rect.height,
            scale: scale.filter(|value| *value > 0.0).unwrap_or(1.0),
        };
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(clip)
            .capture_beyond_viewport(true)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn emulate(&self, device: &DeviceProfile) -> Result<(), AdapterError> {
        let orientation = if device.landscape {
            ScreenOrientation::new(ScreenOrientationType::LandscapePrimary, 90)
        } else {
            ScreenOrientation::new(ScreenOrientationType::PortraitPrimary, 0)
        };
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(device.width)
            .height(device.height)
            .device_scale_factor(device.scale)
            .mobile(device.mobile)
            .screen_orientation(orientation)
            .build()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))?;
        self.page.execute(metrics).await?;
        self.page
            .execute(SetUserAgentOverrideParams::new(device.user_agent))
            .await?;
        self.page
            .execute(SetTouchEmulationEnabledParams::new(device.touch))
            .await?;
        debug!(target: "cdp-adapter", device = device.name, "device emulation applied");
        Ok(())
    }

    async fn version(&self) -> Result<BrowserVersion, AdapterError> {
        let version = self.browser.lock().await.version().await?;
        Ok(BrowserVersion {
            product: version.product,
            protocol_version: version.protocol_version,
            revision: version.revision,
            user_agent: version.user_agent,
            js_version: version.js_version,
        })
    }

    async fn close(&self) -> Result<(), AdapterError> {
        if self.launched {
            let mut browser = self.browser.lock().await;
            browser.close().await?;
            if let Err(err) = browser.wait().await {
                warn!(target: "cdp-adapter", %err, "browser process did not exit cleanly");
            }
        } else {
            self.page.clone().close().await?;
        }
        self.handler.abort();
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn browser_config(cfg: &CdpConfig) -> Result<BrowserConfig, AdapterError> {
    let mut builder = BrowserConfig::builder()
        .request_timeout(cfg.request_timeout)
        .launch_timeout(cfg.launch_timeout);

    if !cfg.headless {
        builder = builder.with_head();
    }

    if std::env::var("SOULSCRIPT_DISABLE_SANDBOX")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
    {
        builder = builder.no_sandbox();
    }

    let mut args: Vec<String> = [
        "--disable-background-networking",
        "--disable-background-timer-throttling",
        "--disable-breakpad",
        "--disable-component-update",
        "--disable-default-apps",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-popup-blocking",
        "--disable-sync",
        "--no-first-run",
        "--no-default-browser-check",
        "--password-store=basic",
        "--use-mock-keychain",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect();
    if cfg.headless {
        args.push("--hide-scrollbars".into());
        args.push("--mute-audio".into());
    }
    args.extend(cfg.extra_args.iter().cloned());
    builder = builder.args(args);

    if let Some(executable) = &cfg.executable {
        if !executable.exists() {
            return Err(AdapterError::new(AdapterErrorKind::LaunchFailed)
                .with_hint(format!(
                    "chrome executable not found at {}",
                    executable.display()
                )));
        }
        builder = builder.chrome_executable(executable.clone());
    }

    if let Some(profile_dir) = &cfg.user_data_dir {
        fs::create_dir_all(profile_dir).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("failed to ensure user-data-dir: {err}"))
        })?;
        builder = builder.user_data_dir(profile_dir.clone());
    }

    builder.build().map_err(|err| {
        AdapterError::new(AdapterErrorKind::Internal)
            .with_hint(format!("browser config error: {err}"))
    })
}

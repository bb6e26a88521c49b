//! Chrome session hosting the search page.
//!
//! Uses chromiumoxide (CDP) to launch a local Chrome or attach to one that is
//! already running with remote debugging enabled.

mod config;
pub mod cookies;
#[cfg(feature = "browser")]
mod page;
pub mod scripts;

pub use config::BrowserEngineConfig;
#[cfg(feature = "browser")]
pub use page::ChromeLeadPage;

use anyhow::Result;

#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use anyhow::Context;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tracing::{debug, info};

#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig};
#[cfg(feature = "browser")]
use futures::StreamExt;

/// A running (or attached) browser.
#[cfg(feature = "browser")]
pub struct BrowserSession {
    config: BrowserEngineConfig,
    browser: Browser,
    handler: JoinHandle<()>,
}

#[cfg(feature = "browser")]
impl BrowserSession {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    /// Launch Chrome, or connect to `remote_url` when configured.
    pub async fn open(config: BrowserEngineConfig) -> Result<Self> {
        let (browser, mut handler) = match config.remote_url.clone() {
            Some(remote_url) => Self::connect_remote(&config, &remote_url).await?,
            None => Self::launch(&config).await?,
        };

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            config,
            browser,
            handler,
        })
    }

    fn find_chrome() -> Result<std::path::PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Install it, or start one with \
             --remote-debugging-port=9222 and pass --remote ws://localhost:9222"
        ))
    }

    async fn launch(config: &BrowserEngineConfig) -> Result<(Browser, chromiumoxide::Handler)> {
        info!("Launching browser (headless={})", config.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(config.timeout));

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")
    }

    async fn connect_remote(
        config: &BrowserEngineConfig,
        url: &str,
    ) -> Result<(Browser, chromiumoxide::Handler)> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, config.timeout
        );

        let ws_url = if url.contains("/devtools/browser/") {
            url.to_string()
        } else {
            Self::discover_ws_url(url).await?
        };
        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(config.timeout),
            ..Default::default()
        };

        Browser::connect_with_config(ws_url, handler_config)
            .await
            .context("Failed to connect to remote browser")
    }

    /// Resolve the browser WebSocket from the `/json/version` endpoint.
    async fn discover_ws_url(url: &str) -> Result<String> {
        let version_url = version_endpoint(url);
        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .context("Failed to connect to remote browser")?
            .json()
            .await
            .context("Failed to parse browser version info")?;

        resp.get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))
    }

    /// Open a tab on `url`, injecting configured cookies first.
    pub async fn open_search(&self, url: &str) -> Result<ChromeLeadPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open a new tab")?;

        if let Some(ref path) = self.config.cookies_file {
            let cookies = cookies::read_cookies(path)?;
            let set = cookies::inject(&page, &cookies).await;
            info!("Injected {} of {} cookies", set, cookies.len());
        }

        info!("Navigating to {}", url);
        page.goto(url)
            .await
            .with_context(|| format!("Failed to open {}", url))?;
        Ok(ChromeLeadPage::new(page))
    }

    /// Close the browser and stop the event handler.
    pub async fn close(mut self) {
        if self.config.remote_url.is_none() {
            if let Err(e) = self.browser.close().await {
                debug!("Browser close failed: {}", e);
            }
        }
        self.handler.abort();
    }
}

/// `ws://host:port[/...]` or `http://host:port` to `http://host:port/json/version`.
pub fn version_endpoint(url: &str) -> String {
    let http_url = url
        .replace("ws://", "http://")
        .replace("wss://", "https://");
    format!("{}/json/version", http_url.trim_end_matches('/'))
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserSession;

#[cfg(not(feature = "browser"))]
impl BrowserSession {
    pub async fn open(_config: BrowserEngineConfig) -> Result<Self> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }

    pub async fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_endpoint() {
        assert_eq!(
            version_endpoint("ws://localhost:9222"),
            "http://localhost:9222/json/version"
        );
        assert_eq!(
            version_endpoint("http://127.0.0.1:9222/"),
            "http://127.0.0.1:9222/json/version"
        );
    }
}

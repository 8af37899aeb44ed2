use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use scraper::{Html, Selector};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

/// Something that can render a page and hand back its visible text.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn open(&mut self) -> Result<()>;
    async fn page_text(&self, url: &str) -> Result<String>;
    async fn close(&mut self) -> Result<()>;
}

/// A headless Chrome instance scoped to one run of one retailer.
///
/// The browser process is released on `close` or, failing that, on drop.
pub struct BrowserSession {
    config: ScraperConfig,
    browser: Option<Arc<Browser>>,
}

impl BrowserSession {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            browser: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.browser.is_some()
    }

    fn launch(config: &ScraperConfig) -> Result<Browser> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false) // Often needed in containerized environments
            .idle_browser_timeout(config.navigation_timeout() * 10)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--blink-settings=imagesEnabled=false"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        Browser::new(launch_options).map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))
    }

    fn render(browser: &Browser, url: &str, user_agent: &str, timeout: Duration) -> Result<String> {
        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(timeout);

        let result = (|| {
            tab.set_user_agent(user_agent, None, None)
                .map_err(|e| AppError::Browser(format!("Failed to set user agent: {}", e)))?;
            tab.navigate_to(url)
                .map_err(|e| AppError::Scraping(format!("Navigation failed: {}", e)))?;
            tab.wait_until_navigated()
                .map_err(|e| AppError::Scraping(format!("Page load failed: {}", e)))?;
            tab.get_content()
                .map_err(|e| AppError::Scraping(format!("Failed to get page content: {}", e)))
        })();

        // Close tab to free resources
        let _ = tab.close(true);
        result
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    async fn open(&mut self) -> Result<()> {
        if self.browser.is_some() {
            return Ok(());
        }

        let config = self.config.clone();
        let browser = tokio::task::spawn_blocking(move || Self::launch(&config)).await??;
        self.browser = Some(Arc::new(browser));
        tracing::debug!(headless = self.config.headless, "Browser session opened");
        Ok(())
    }

    async fn page_text(&self, url: &str) -> Result<String> {
        let browser = self
            .browser
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| AppError::Browser("browser session is not open".to_string()))?;

        let url = url.to_string();
        let user_agent = self.config.user_agent.clone();
        let timeout = self.config.navigation_timeout();

        let html = tokio::task::spawn_blocking(move || Self::render(&browser, &url, &user_agent, timeout)).await??;
        Ok(extract_body_text(&html))
    }

    async fn close(&mut self) -> Result<()> {
        if self.browser.take().is_some() {
            tracing::debug!("Browser session closed");
        }
        Ok(())
    }
}

/// Visible text of the document body, whitespace-joined, without script and
/// style contents.
pub fn extract_body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| matches!(e.name(), "script" | "style" | "noscript")))
            .unwrap_or(false);
        let trimmed = text.trim();
        if !hidden && !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }

    parts.join(" ")
}

/// `url` with each pair appended to its query string.
pub fn append_query_params(url: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut parsed = Url::parse(url).map_err(|e| AppError::Validation(format!("Invalid URL {}: {}", url, e)))?;
    {
        let mut query = parsed.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }
    Ok(parsed.to_string())
}

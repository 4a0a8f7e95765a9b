use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://www.tennisabstract.com";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
const DEFAULT_WAIT_SECS: u64 = 5;
const DEFAULT_POLL_MS: u64 = 100;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Firefox,
}

impl Browser {
    fn from_env_value(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "firefox" | "gecko" | "geckodriver" => Browser::Firefox,
            _ => Browser::Chrome,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub player_list_url: String,
    pub webdriver_url: String,
    /// Upper bound on each wait step of a page interaction.
    pub wait: Duration,
    pub poll: Duration,
    pub request_timeout: Duration,
    pub headless: bool,
    pub browser: Browser,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            player_list_url: format!("{DEFAULT_BASE_URL}/mwplayerlist.js"),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            wait: Duration::from_secs(DEFAULT_WAIT_SECS),
            poll: Duration::from_millis(DEFAULT_POLL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            headless: true,
            browser: Browser::Chrome,
        }
    }
}

impl ScrapeConfig {
    pub fn from_env() -> Self {
        let base_url = env_string("TA_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let player_list_url =
            env_string("TA_PLAYER_LIST_URL").unwrap_or_else(|| format!("{base_url}/mwplayerlist.js"));
        let webdriver_url = env_string("TA_WEBDRIVER_URL")
            .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let wait_secs = env_u64("TA_WAIT_SECS", DEFAULT_WAIT_SECS).clamp(1, 60);
        let poll_ms = env_u64("TA_POLL_MS", DEFAULT_POLL_MS).clamp(10, 2000);
        let timeout_secs =
            env_u64("TA_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS).clamp(1, 120);
        let browser = env_string("TA_BROWSER")
            .map(|raw| Browser::from_env_value(&raw))
            .unwrap_or(Browser::Chrome);

        Self {
            base_url,
            player_list_url,
            webdriver_url,
            wait: Duration::from_secs(wait_secs),
            poll: Duration::from_millis(poll_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            headless: env_bool("TA_HEADLESS", true),
            browser,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}

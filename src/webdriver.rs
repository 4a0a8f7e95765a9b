use std::time::Duration;

use anyhow::Context;
use reqwest::Method;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::{Browser, ScrapeConfig};
use crate::error::SessionError;
use crate::http_client::build_client;
use crate::session::{PageHandle, PageSession};

/// Key the protocol uses for element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const WINDOW_SIZE: (u32, u32) = (1440, 810);

pub struct WebDriverSession {
    client: Client,
    endpoint: String,
    browser: Browser,
    headless: bool,
    page_load_timeout: Duration,
    session_id: Option<String>,
}

impl WebDriverSession {
    pub fn new(config: &ScrapeConfig) -> anyhow::Result<Self> {
        // Page loads can outlast a plain request.
        let page_load_timeout = config.request_timeout * 3;
        Ok(Self {
            client: build_client(page_load_timeout)?,
            endpoint: config.webdriver_url.trim_end_matches('/').to_string(),
            browser: config.browser,
            headless: config.headless,
            page_load_timeout,
            session_id: None,
        })
    }

    fn capabilities(&self) -> Value {
        let (w, h) = WINDOW_SIZE;
        match self.browser {
            Browser::Chrome => {
                let mut args = vec![
                    "--no-sandbox".to_string(),
                    "--disable-extensions".to_string(),
                    format!("--window-size={w},{h}"),
                ];
                if self.headless {
                    args.push("--headless=new".to_string());
                }
                json!({"capabilities": {"alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {"args": args},
                }}})
            }
            Browser::Firefox => {
                let mut args = vec![format!("--width={w}"), format!("--height={h}")];
                if self.headless {
                    args.push("-headless".to_string());
                }
                json!({"capabilities": {"alwaysMatch": {
                    "browserName": "firefox",
                    "moz:firefoxOptions": {"args": args},
                }}})
            }
        }
    }

    fn session_path(&self, suffix: &str) -> Result<String, SessionError> {
        let id = self.session_id.as_deref().ok_or_else(|| SessionError::Protocol {
            command: suffix.to_string(),
            message: "session is not open".to_string(),
        })?;
        Ok(format!("{}/session/{id}{suffix}", self.endpoint))
    }

    fn command(&self, method: Method, url: &str, body: Option<Value>) -> Result<Value, SessionError> {
        let mut req = self.client.request(method.clone(), url);
        if let Some(body) = body {
            req = req.json(&body);
        } else if method == Method::POST {
            req = req.json(&json!({}));
        }
        let resp = req
            .send()
            .with_context(|| format!("webdriver {method} {url} failed"))?;
        let status = resp.status();
        let payload: Value = resp.json().context("invalid webdriver response")?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(value);
        }
        let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
        let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
        Err(SessionError::Protocol {
            command: error.to_string(),
            message: message.to_string(),
        })
    }

    fn find(&self, selector: &str) -> Result<Option<String>, SessionError> {
        let url = self.session_path("/element")?;
        let found = self.command(
            Method::POST,
            &url,
            Some(json!({"using": "css selector", "value": selector})),
        );
        match found {
            Ok(value) => Ok(value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(str::to_string)),
            Err(SessionError::Protocol { command, .. }) if command == "no such element" => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn element_get(&self, element: &str, suffix: &str) -> Result<Value, SessionError> {
        let url = self.session_path(&format!("/element/{element}{suffix}"))?;
        self.command(Method::GET, &url, None)
    }
}

fn is_stale(err: &SessionError) -> bool {
    matches!(err, SessionError::Protocol { command, .. } if command == "stale element reference")
}

impl PageHandle for WebDriverSession {
    fn is_displayed(&mut self, selector: &str) -> Result<bool, SessionError> {
        let Some(element) = self.find(selector)? else {
            return Ok(false);
        };
        match self.element_get(&element, "/displayed") {
            Ok(value) => Ok(value.as_bool().unwrap_or(false)),
            // Re-rendered between the lookup and the check.
            Err(err) if is_stale(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn click(&mut self, selector: &str) -> Result<(), SessionError> {
        let element = self
            .find(selector)?
            .ok_or_else(|| SessionError::MissingElement(selector.to_string()))?;
        let url = self.session_path(&format!("/element/{element}/click"))?;
        self.command(Method::POST, &url, None)?;
        debug!(selector, "clicked");
        Ok(())
    }

    fn text(&mut self, selector: &str) -> Result<Option<String>, SessionError> {
        let Some(element) = self.find(selector)? else {
            return Ok(None);
        };
        match self.element_get(&element, "/text") {
            Ok(value) => Ok(value.as_str().map(str::to_string)),
            Err(err) if is_stale(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn outer_html(&mut self, selector: &str) -> Result<Option<String>, SessionError> {
        let Some(element) = self.find(selector)? else {
            return Ok(None);
        };
        let value = self.element_get(&element, "/property/outerHTML")?;
        Ok(value.as_str().map(str::to_string))
    }
}

impl PageSession for WebDriverSession {
    fn open(&mut self) -> Result<(), SessionError> {
        if self.session_id.is_some() {
            return Ok(());
        }
        let url = format!("{}/session", self.endpoint);
        let value = self.command(Method::POST, &url, Some(self.capabilities()))?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::Protocol {
                command: "new session".to_string(),
                message: "response carried no sessionId".to_string(),
            })?;
        info!(browser = ?self.browser, session = id, "opened webdriver session");
        self.session_id = Some(id.to_string());

        let timeouts = self.session_path("/timeouts")?;
        let page_load_ms = self.page_load_timeout.as_millis() as u64;
        self.command(Method::POST, &timeouts, Some(json!({"pageLoad": page_load_ms})))?;
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let path = self.session_path("/url")?;
        self.command(Method::POST, &path, Some(json!({"url": url})))?;
        debug!(url, "navigated");
        Ok(())
    }

    fn close(&mut self) -> Result<(), SessionError> {
        let Some(id) = self.session_id.take() else {
            return Ok(());
        };
        let url = format!("{}/session/{id}", self.endpoint);
        self.command(Method::DELETE, &url, None)?;
        debug!(session = %id, "closed webdriver session");
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

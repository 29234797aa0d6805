use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Moves one request over the wire. An `Err` means no response arrived at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport. Session cookies live in a shared jar so every
/// request carries credentials.
pub struct HttpTransport {
    client: Client,
    jar: Arc<Jar>,
    origin: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let origin = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, jar, origin })
    }

    /// Seed the jar from a session file written by `save_session`.
    pub fn load_session(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            log::debug!("No session file at {}", path.display());
            return Ok(());
        }

        let saved = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        for pair in saved.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(&format!("{}; Path=/", pair), &self.origin);
        }
        log::debug!("Loaded session cookies from {}", path.display());
        Ok(())
    }

    pub fn save_session(&self, path: &Path) -> Result<()> {
        let cookies = self
            .jar
            .cookies(&self.origin)
            .and_then(|value| value.to_str().ok().map(str::to_string))
            .unwrap_or_default();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, cookies)
            .with_context(|| format!("Failed to write session file {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

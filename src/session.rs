use crate::error::SessionUnavailable;
use crate::fetcher::DEFAULT_USER_AGENT;
use crate::models::Session;
use crate::{debug_eprintln, debug_println};
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Anything that can hand the scraper a ready-to-use cookie set.
pub trait SessionProvider {
    fn acquire(&self) -> Result<Session, SessionUnavailable>;
}

pub fn default_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
    headers.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());
    headers
}

/// Cookies exported from a browser where the consent banner was already accepted.
pub struct CookieFileSession {
    pub path: PathBuf,
}

// Shape of a browser-automation cookie dump; every other key is ignored
#[derive(Debug, Deserialize)]
struct ExportedCookie {
    name: String,
    value: String,
}

impl SessionProvider for CookieFileSession {
    fn acquire(&self) -> Result<Session, SessionUnavailable> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| SessionUnavailable(format!("cannot read {}: {}", self.path.display(), e)))?;
        let cookies = parse_cookie_export(&content)?;
        if cookies.is_empty() {
            return Err(SessionUnavailable(format!("no cookies in {}", self.path.display())));
        }
        println!("Loaded {} cookies from {}", cookies.len(), self.path.display());
        Ok(Session::new(cookies, default_headers()))
    }
}

/// Accepts a JSON array of `{name, value}` objects, a Netscape `cookies.txt`,
/// or plain `name=value` pairs separated by `;` or newlines.
pub fn parse_cookie_export(content: &str) -> Result<BTreeMap<String, String>, SessionUnavailable> {
    let trimmed = content.trim();

    if trimmed.starts_with('[') {
        let exported: Vec<ExportedCookie> = serde_json::from_str(trimmed)
            .map_err(|e| SessionUnavailable(format!("invalid JSON cookie export: {}", e)))?;
        return Ok(exported
            .into_iter()
            .filter(|c| !c.name.is_empty())
            .map(|c| (c.name, c.value))
            .collect());
    }

    let mut cookies = BTreeMap::new();
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() == 7 {
            cookies.insert(columns[5].to_string(), columns[6].to_string());
            continue;
        }

        cookies.extend(parse_cookie_pairs(line));
    }
    Ok(cookies)
}

/// `a=1; b=2` -> {a: 1, b: 2}
pub fn parse_cookie_pairs(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Visits the search page without a browser and keeps whatever cookies the portal sets.
pub struct WarmupSession {
    pub url: String,
    pub attempts: u32,
    pub wait: Duration,
    pub timeout: Duration,
}

impl WarmupSession {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            attempts: 3,
            wait: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
        }
    }

    fn try_once(&self, client: &Client, jar: &Jar, url: &Url) -> Result<BTreeMap<String, String>, String> {
        let mut request = client.get(url.clone());
        for (name, value) in default_headers() {
            request = request.header(name, value);
        }
        let response = request.send().map_err(|e| e.to_string())?;
        debug_println!("Warm-up request answered HTTP {}", response.status());

        let cookies = jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(parse_cookie_pairs))
            .unwrap_or_default();
        Ok(cookies)
    }
}

impl SessionProvider for WarmupSession {
    fn acquire(&self) -> Result<Session, SessionUnavailable> {
        let url = Url::parse(&self.url).map_err(|e| SessionUnavailable(format!("invalid warm-up URL {}: {}", self.url, e)))?;
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(self.timeout)
            .build()
            .map_err(|e| SessionUnavailable(e.to_string()))?;

        let attempts = self.attempts.max(1);
        let mut last_problem = String::from("portal set no cookies");
        for attempt in 1..=attempts {
            match self.try_once(&client, &jar, &url) {
                Ok(cookies) if !cookies.is_empty() => {
                    println!("Obtained {} session cookies from {}", cookies.len(), self.url);
                    return Ok(Session::new(cookies, default_headers()));
                }
                Ok(_) => {
                    debug_eprintln!("Warm-up attempt {} returned no cookies", attempt);
                    last_problem = String::from("portal set no cookies");
                }
                Err(e) => {
                    debug_eprintln!("Warm-up attempt {} failed: {}", attempt, e);
                    last_problem = e;
                }
            }
            if attempt < attempts {
                thread::sleep(self.wait);
            }
        }

        Err(SessionUnavailable(format!(
            "{} after {} attempts: {}",
            self.url, attempts, last_problem
        )))
    }
}

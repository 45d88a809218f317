use crate::error::{FetchError, TransportError};
use crate::models::Session;
use crate::{debug_eprintln, debug_println};
use reqwest::blocking::Client;
use scraper::Html;
use std::thread;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// One GET with the session's headers and cookies applied.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, session: &Session) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, session: &Session) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.get(url);
        for (name, value) in session.headers() {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(cookies) = session.cookie_header() {
            request = request.header(reqwest::header::COOKIE, cookies);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Applies the retry policy to every GET. Used for index and detail pages alike.
pub struct DetailFetcher<'a, T: Transport> {
    transport: &'a T,
    session: &'a Session,
    policy: RetryPolicy,
}

impl<'a, T: Transport> DetailFetcher<'a, T> {
    pub fn new(transport: &'a T, session: &'a Session, policy: RetryPolicy) -> Self {
        Self {
            transport,
            session,
            policy,
        }
    }

    pub fn fetch_document(&self, url: &str) -> Result<Html, FetchError> {
        let body = self.fetch_body(url)?;
        Ok(Html::parse_document(&body))
    }

    pub fn fetch_body(&self, url: &str) -> Result<String, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug_println!("GET {} (attempt {}/{})", url, attempt, max_attempts);

            match self.transport.get(url, self.session) {
                Ok(response) if response.status == 200 => return Ok(response.body),
                Ok(response) => {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: response.status,
                    });
                }
                Err(err) => {
                    debug_eprintln!("Attempt {} failed for {}: {}", attempt, url, err);
                    if attempt >= max_attempts {
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            last_error: err,
                        });
                    }
                    if !self.policy.backoff.is_zero() {
                        thread::sleep(self.policy.backoff);
                    }
                }
            }
        }
    }
}

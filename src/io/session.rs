//! Authenticated HTTP session against the report site
//!
//! Login flow:
//! - GET /login, scrape the CSRF token from the `csrf-token` meta tag
//! - POST /login with the token and credentials (form encoded)
//! - Session cookies stay in the client's cookie store for every later GET
//!
//! A wrong password is not detected here: the site still answers the POST,
//! and the failure shows up later as an empty report list.

use crate::domain::{AuthError, FetchError};
use crate::infra::config::{Credentials, SiteConfig};
use regex::Regex;
use reqwest::blocking::Client;
use std::sync::OnceLock;
use tracing::{debug, info};

const LOGIN_PATH: &str = "/login";

/// Source of newline-free HTML pages addressed by path on the remote host
pub trait PageSource {
    fn get_page(&self, path: &str) -> Result<String, FetchError>;
}

/// The site occasionally breaks attributes across lines, which defeats the
/// regexes below; every page body goes through this first.
pub fn strip_newlines(body: &str) -> String {
    body.replace('\n', "")
}

fn csrf_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"csrf-token"?\s+content="(.+?)""#).expect("csrf regex is valid")
    })
}

/// Find the CSRF token in a (newline-stripped) login page
pub fn extract_csrf_token(html: &str) -> Option<&str> {
    csrf_regex().captures(html).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Authenticated client state, reused serially for every request of a query
#[derive(Debug)]
pub struct Session {
    client: Client,
    base_url: String,
}

impl Session {
    /// Log in and return a session carrying the site's cookies
    pub fn authenticate(site: &SiteConfig, credentials: &Credentials) -> Result<Self, AuthError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(site.request_timeout)
            .user_agent(site.user_agent.as_str())
            .build()?;
        let session = Self { client, base_url: site.base_url.trim_end_matches('/').to_string() };

        let login_url = session.url(LOGIN_PATH);
        let response = session.client.get(&login_url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::LoginPageStatus(status.as_u16()));
        }
        let page = strip_newlines(&response.text()?);

        let token = extract_csrf_token(&page).ok_or(AuthError::CsrfTokenMissing)?;
        debug!(token_len = %token.len(), "csrf_token_found");

        let form = [
            ("authenticity_token", token),
            ("user[login]", credentials.email.as_str()),
            ("user[password]", credentials.password.as_str()),
            ("commit", "Log In"),
        ];
        let response = session.client.post(&login_url).form(&form).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::LoginRejected(status.as_u16()));
        }

        info!(base_url = %session.base_url, "session_authenticated");
        Ok(session)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl PageSource for Session {
    fn get_page(&self, path: &str) -> Result<String, FetchError> {
        let request_err = |source| FetchError::Request { path: path.to_string(), source };

        let response = self.client.get(self.url(path)).send().map_err(request_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { path: path.to_string(), status: status.as_u16() });
        }
        let body = response.text().map_err(request_err)?;
        debug!(path = %path, bytes = %body.len(), "page_fetched");
        Ok(body)
    }
}

//! The browsing session the crawler drives.
//!
//! [`BrowserSession`] is the narrow surface the rest of the crate sees: navigate,
//! query the current page, open and close auxiliary contexts, log in and quit.
//! [`HttpBrowser`] implements it over a cookie-holding blocking HTTP client.

use std::ops::{Deref, DerefMut};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use regex::Regex;
use reqwest::blocking::Client;

use crate::error::{AuthError, BrowserError};
use crate::models::Anchor;
use crate::parser;

pub const ORIGIN: &str = "https://www.facebook.com";
const LOGIN_URL: &str = "https://www.facebook.com/login";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub trait BrowserSession {
    fn log_in(&mut self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Load `url` into the active context.
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Links on the active page whose href contains `fragment`.
    fn anchors_containing(&self, fragment: &str) -> Result<Vec<Anchor>, BrowserError>;

    /// Text nodes on the active page matching `pattern`, in document order.
    fn texts_matching(&self, pattern: &Regex) -> Result<Vec<String>, BrowserError>;

    /// Open an auxiliary context and make it active.
    fn open_context(&mut self) -> Result<(), BrowserError>;

    /// Close the active auxiliary context and return to the one below it.
    /// The primary context is never closed.
    fn close_context(&mut self);

    /// Release the session. Further calls fail with [`BrowserError::Closed`].
    fn quit(&mut self);
}

/// An auxiliary context that is closed again when dropped, on every path.
pub struct DetailTab<'a, B: BrowserSession + ?Sized> {
    session: &'a mut B,
}

impl<'a, B: BrowserSession + ?Sized> DetailTab<'a, B> {
    pub fn open(session: &'a mut B) -> Result<Self, BrowserError> {
        session.open_context()?;
        Ok(Self { session })
    }
}

impl<B: BrowserSession + ?Sized> Deref for DetailTab<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.session
    }
}

impl<B: BrowserSession + ?Sized> DerefMut for DetailTab<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.session
    }
}

impl<B: BrowserSession + ?Sized> Drop for DetailTab<'_, B> {
    fn drop(&mut self) {
        self.session.close_context();
    }
}

pub struct HttpBrowser {
    client: Client,
    /// Body of the page loaded in each open context; the last one is active.
    contexts: Vec<Option<String>>,
    settle: Duration,
    closed: bool,
}

impl HttpBrowser {
    /// `settle` is how long to pause after every page load.
    pub fn new(settle: Duration) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(BrowserError::Client)?;

        Ok(Self {
            client,
            contexts: vec![None],
            settle,
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    fn active_page(&self) -> Result<&str, BrowserError> {
        self.ensure_open()?;
        self.contexts
            .last()
            .and_then(|page| page.as_deref())
            .ok_or(BrowserError::NoPage)
    }

    fn load_into_active(&mut self, body: String) {
        if let Some(active) = self.contexts.last_mut() {
            *active = Some(body);
        }
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
    }
}

fn read_body(url: &str, response: reqwest::blocking::Response) -> Result<String, BrowserError> {
    let status = response.status();
    if !status.is_success() {
        return Err(BrowserError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response.text().map_err(|source| BrowserError::Request {
        url: url.to_string(),
        source,
    })
}

impl BrowserSession for HttpBrowser {
    fn log_in(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        info!("Logging into Facebook...");
        self.navigate(LOGIN_URL)?;

        let form = parser::login_form(self.active_page()?)
            .ok_or_else(|| AuthError::Rejected("login form not found".to_string()))?;
        let action = form
            .action
            .map(|action| parser::resolve_url(&action, ORIGIN))
            .unwrap_or_else(|| LOGIN_URL.to_string());

        let mut fields = form.hidden_fields;
        fields.push(("email".to_string(), email.to_string()));
        fields.push(("pass".to_string(), password.to_string()));
        fields.push(("login".to_string(), "1".to_string()));

        debug!("Submitting login form to {}", action);
        let response = self
            .client
            .post(&action)
            .form(&fields)
            .send()
            .map_err(|source| BrowserError::Request {
                url: action.clone(),
                source,
            })?;
        let landed = response.url().to_string();
        let body = read_body(&action, response)?;

        if landed.contains("/login") || parser::login_form(&body).is_some() {
            return Err(AuthError::Rejected(format!("still on login page after submit ({landed})")));
        }

        self.load_into_active(body);
        info!("Logged in");
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        debug!("Navigating to {}", url);

        let response = self.client.get(url).send().map_err(|source| BrowserError::Request {
            url: url.to_string(),
            source,
        })?;
        let body = read_body(url, response)?;
        self.load_into_active(body);
        Ok(())
    }

    fn anchors_containing(&self, fragment: &str) -> Result<Vec<Anchor>, BrowserError> {
        Ok(parser::anchors_containing(self.active_page()?, fragment))
    }

    fn texts_matching(&self, pattern: &Regex) -> Result<Vec<String>, BrowserError> {
        Ok(parser::texts_matching(self.active_page()?, pattern))
    }

    fn open_context(&mut self) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.contexts.push(None);
        Ok(())
    }

    fn close_context(&mut self) {
        if self.contexts.len() > 1 {
            self.contexts.pop();
        }
    }

    fn quit(&mut self) {
        if !self.closed {
            self.closed = true;
            self.contexts.clear();
            info!("Browser session closed");
        }
    }
}

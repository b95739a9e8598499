// tests/common/mod.rs
// In-memory stand-ins for the browsing session and the mail transport.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use listingwatch::browser::BrowserSession;
use listingwatch::config::Credentials;
use listingwatch::error::{AuthError, BrowserError, TransportError};
use listingwatch::models::{Anchor, Listing};
use listingwatch::notify::Notifier;
use listingwatch::parser;
use listingwatch::poll::{PollOptions, ShutdownTrigger};
use regex::Regex;

pub const SEARCH_URL: &str =
    "https://www.facebook.com/marketplace/category/search?query=bike&exact=false&category_id=vehicles";

pub fn item_url(id: u32) -> String {
    format!("https://www.facebook.com/marketplace/item/{id}/")
}

/// A search results page linking to the given `(id, title)` items.
pub fn search_page(items: &[(u32, &str)]) -> String {
    let links: String = items
        .iter()
        .map(|(id, title)| {
            format!(
                r#"<a href="/marketplace/item/{id}/?ref=search">
                     <div><span>{title}</span></div><div><span>$100</span></div>
                   </a>"#
            )
        })
        .collect();
    format!("<html><body><h1>Marketplace</h1>{links}</body></html>")
}

pub fn detail_page(posted: &str) -> String {
    format!("<html><body><h1>Item</h1><span>{posted}</span><p>Seller info</p></body></html>")
}

pub fn options() -> PollOptions {
    PollOptions {
        search_url: SEARCH_URL.to_string(),
        login: Credentials {
            user: "seller@example.com".to_string(),
            password: "hunter2".to_string(),
        },
        poll_interval: Duration::ZERO,
        max_minutes: 5,
    }
}

#[derive(Debug, Default)]
pub struct BrowserLog {
    pub logins: usize,
    pub navigations: Vec<String>,
    pub quits: usize,
    pub max_depth: usize,
}

impl BrowserLog {
    pub fn search_loads(&self) -> usize {
        self.navigations.iter().filter(|url| *url == SEARCH_URL).count()
    }
}

pub struct FakeBrowser {
    /// Responses per URL, consumed front to back; the last one repeats. `None` fails the load.
    pages: HashMap<String, VecDeque<Option<String>>>,
    contexts: Vec<Option<String>>,
    accept_login: bool,
    interrupt: Option<(usize, ShutdownTrigger)>,
    closed: bool,
    pub log: Rc<RefCell<BrowserLog>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            contexts: vec![None],
            accept_login: true,
            interrupt: None,
            closed: false,
            log: Rc::new(RefCell::new(BrowserLog::default())),
        }
    }

    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.entry(url.to_string()).or_default().push_back(Some(html));
        self
    }

    pub fn failing_page(mut self, url: &str) -> Self {
        self.pages.entry(url.to_string()).or_default().push_back(None);
        self
    }

    pub fn rejecting_login(mut self) -> Self {
        self.accept_login = false;
        self
    }

    /// Fire `trigger` when the search page is loaded for the `nth` time.
    pub fn interrupt_on_search(mut self, nth: usize, trigger: ShutdownTrigger) -> Self {
        self.interrupt = Some((nth, trigger));
        self
    }

    fn active_page(&self) -> Result<&str, BrowserError> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        self.contexts
            .last()
            .and_then(|page| page.as_deref())
            .ok_or(BrowserError::NoPage)
    }
}

impl BrowserSession for FakeBrowser {
    fn log_in(&mut self, _email: &str, _password: &str) -> Result<(), AuthError> {
        self.log.borrow_mut().logins += 1;
        if self.accept_login {
            Ok(())
        } else {
            Err(AuthError::Rejected("wrong password".to_string()))
        }
    }

    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        self.log.borrow_mut().navigations.push(url.to_string());

        if url == SEARCH_URL {
            let loads = self.log.borrow().search_loads();
            if let Some((nth, trigger)) = &self.interrupt {
                if loads == *nth {
                    trigger.fire();
                }
            }
        }

        let response = match self.pages.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().flatten(),
            Some(queue) => queue.front().cloned().flatten(),
            None => None,
        };
        let body = response.ok_or_else(|| BrowserError::Status {
            url: url.to_string(),
            status: 500,
        })?;

        if let Some(active) = self.contexts.last_mut() {
            *active = Some(body);
        }
        Ok(())
    }

    fn anchors_containing(&self, fragment: &str) -> Result<Vec<Anchor>, BrowserError> {
        Ok(parser::anchors_containing(self.active_page()?, fragment))
    }

    fn texts_matching(&self, pattern: &Regex) -> Result<Vec<String>, BrowserError> {
        Ok(parser::texts_matching(self.active_page()?, pattern))
    }

    fn open_context(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        self.contexts.push(None);
        let mut log = self.log.borrow_mut();
        log.max_depth = log.max_depth.max(self.contexts.len());
        Ok(())
    }

    fn close_context(&mut self) {
        if self.contexts.len() > 1 {
            self.contexts.pop();
        }
    }

    fn quit(&mut self) {
        self.closed = true;
        self.log.borrow_mut().quits += 1;
    }
}

/// Records every notification attempt; the calls listed in `failing_calls` (0-based) fail.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Rc<RefCell<Vec<Vec<String>>>>,
    failing_calls: HashSet<usize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.failing_calls.extend(calls.iter().copied());
        self
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, listings: &[Listing]) -> Result<(), TransportError> {
        let mut sent = self.sent.borrow_mut();
        let call = sent.len();
        sent.push(listings.iter().map(|l| l.id.clone()).collect());
        if self.failing_calls.contains(&call) {
            Err(TransportError::Smtp("535 authentication failed".to_string()))
        } else {
            Ok(())
        }
    }
}

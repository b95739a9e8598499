//! The crawl loop: log in, crawl, wait, crawl again until interrupted.

use std::cell::Cell;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::browser::BrowserSession;
use crate::config::{Credentials, Settings};
use crate::dedup::{DedupFilter, SeenSet};
use crate::error::{AuthError, CycleError};
use crate::extractor::ListingStream;
use crate::models::Listing;
use crate::notify::Notifier;

/// Number of listings echoed to the log after each pass.
const SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub search_url: String,
    pub login: Credentials,
    pub poll_interval: Duration,
    pub max_minutes: u64,
}

impl PollOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            search_url: settings.marketplace_url(),
            login: settings.facebook.clone(),
            poll_interval: settings.poll_interval,
            max_minutes: settings.max_minutes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    LoggedIn,
    Crawling,
    Waiting,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub listings: usize,
    pub notified: usize,
    pub failed_notifications: usize,
}

/// Fires a [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownTrigger(Sender<()>);

impl ShutdownTrigger {
    pub fn fire(&self) {
        let _ = self.0.send(());
    }
}

/// Receiving side of the interrupt signal. Once observed, it stays requested.
#[derive(Debug)]
pub struct Shutdown {
    rx: Receiver<()>,
    requested: Cell<bool>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = mpsc::channel();
    (
        ShutdownTrigger(tx),
        Shutdown {
            rx,
            requested: Cell::new(false),
        },
    )
}

impl Shutdown {
    pub fn is_requested(&self) -> bool {
        if !self.requested.get() && self.rx.try_recv().is_ok() {
            self.requested.set(true);
        }
        self.requested.get()
    }

    /// Block for `timeout` or until shutdown is requested; returns true on shutdown.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_requested() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                self.requested.set(true);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                // Nobody can interrupt any more; plain sleep.
                thread::sleep(timeout);
                false
            }
        }
    }
}

/// Fire `trigger` on Ctrl+C; a second Ctrl+C exits the process at once with
/// status 130. The signal is awaited on a background thread with its own
/// single-threaded tokio runtime.
pub fn listen_for_interrupt(trigger: ShutdownTrigger) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                info!("Interrupt received, stopping...");
                trigger.fire();

                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Second interrupt received, exiting immediately");
                    std::process::exit(130);
                }
            });
        })?;
    Ok(())
}

pub struct PollLoop<B: BrowserSession, N: Notifier> {
    session: B,
    notifier: N,
    filter: DedupFilter,
    seen: SeenSet,
    options: PollOptions,
    shutdown: Shutdown,
    state: State,
}

impl<B: BrowserSession, N: Notifier> PollLoop<B, N> {
    pub fn new(session: B, notifier: N, options: PollOptions, shutdown: Shutdown) -> Self {
        Self {
            session,
            notifier,
            filter: DedupFilter::new(options.max_minutes),
            seen: SeenSet::new(),
            options,
            shutdown,
            state: State::Init,
        }
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Run until interrupted. Only a failed login ends the loop with an error.
    /// The browsing session is released when the loop is dropped, which `run`
    /// does on every return path.
    pub fn run(mut self) -> Result<(), AuthError> {
        loop {
            self.state = match self.state {
                State::Init if self.shutdown.is_requested() => State::Stopped,
                State::Init => match self.log_in() {
                    Ok(()) => State::LoggedIn,
                    Err(e) => {
                        error!("Error during Facebook login: {}", e);
                        return Err(e);
                    }
                },
                State::LoggedIn => {
                    if self.crawl() {
                        info!("Initial crawl complete. Notified listings: {}", self.seen.len());
                    }
                    self.after_crawl()
                }
                State::Crawling => {
                    self.crawl();
                    self.after_crawl()
                }
                State::Waiting => {
                    if self.shutdown.wait(self.options.poll_interval) {
                        State::Stopped
                    } else {
                        State::Crawling
                    }
                }
                State::Stopped => {
                    info!("Stopped by user.");
                    return Ok(());
                }
            };
        }
    }

    fn log_in(&mut self) -> Result<(), AuthError> {
        let login = &self.options.login;
        self.session.log_in(&login.user, &login.password)
    }

    fn after_crawl(&self) -> State {
        if self.shutdown.is_requested() {
            State::Stopped
        } else {
            State::Waiting
        }
    }

    /// Run one pass and log its outcome; returns whether the pass completed.
    fn crawl(&mut self) -> bool {
        match self.crawl_once() {
            Ok(report) => {
                info!(
                    "Pass finished: {} listings, {} notified, {} failed notifications",
                    report.listings, report.notified, report.failed_notifications
                );
                true
            }
            Err(e) => {
                error!("Error in poll cycle: {}", e);
                false
            }
        }
    }

    /// One fetch-extract-filter-notify pass. Every qualifying listing is
    /// notified on its own, as soon as it has been read.
    pub fn crawl_once(&mut self) -> Result<CycleReport, CycleError> {
        info!("Fetching current listings...");
        info!("Marketplace URL: {}", self.options.search_url);

        let listings = ListingStream::open(&mut self.session, &self.options.search_url)
            .map_err(|source| CycleError::SearchPage {
                url: self.options.search_url.clone(),
                source,
            })?
            .until(&self.shutdown);

        let mut report = CycleReport::default();
        let mut sample: Vec<Listing> = Vec::with_capacity(SAMPLE_SIZE);

        for listing in listings {
            if self.shutdown.is_requested() {
                break;
            }
            report.listings += 1;

            if self.filter.evaluate(&listing, &self.seen) {
                match self.notifier.notify(std::slice::from_ref(&listing)) {
                    Ok(()) => {
                        report.notified += 1;
                        info!(
                            "Sent email for listing: {} | {} | {}",
                            listing.title, listing.id, listing.posted_text
                        );
                    }
                    Err(e) => {
                        report.failed_notifications += 1;
                        error!("Error sending email for listing {}: {}", listing.id, e);
                    }
                }
                self.seen.insert(listing.id.clone());
            }

            if sample.len() < SAMPLE_SIZE {
                sample.push(listing);
            }
        }

        if sample.is_empty() {
            info!("No listings found to log.");
        } else {
            info!("First {} visible listings (title, url, posted time):", sample.len());
            for listing in &sample {
                info!("{} | {} | {}", listing.title, listing.id, listing.posted_text);
            }
        }

        Ok(report)
    }
}

impl<B: BrowserSession, N: Notifier> Drop for PollLoop<B, N> {
    fn drop(&mut self) {
        self.session.quit();
    }
}

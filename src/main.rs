use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use listingwatch::browser::HttpBrowser;
use listingwatch::config::{self, Settings};
use listingwatch::logging;
use listingwatch::notify::EmailNotifier;
use listingwatch::poll::{self, PollLoop, PollOptions};
use log::info;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Listingwatch - Facebook Marketplace new listing notifier")]
struct Args {
    /// Path to config.json (defaults to the file next to the executable)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Seconds to pause after each page load
    #[clap(short, long, default_value = "3")]
    page_delay: u64,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let settings = Settings::load(&config_path)
        .with_context(|| format!("Could not load settings from {}", config_path.display()))?;

    if let Some(log_file) = logging::initialize(&settings.log_dir(), args.debug) {
        info!("Logging to {}", log_file.display());
    }

    let notifier = EmailNotifier::new(&settings.mail).context("Could not set up mail transport")?;

    let (trigger, shutdown) = poll::shutdown_channel();
    poll::listen_for_interrupt(trigger).context("Could not install interrupt handler")?;

    let browser = HttpBrowser::new(Duration::from_secs(args.page_delay))
        .context("Could not start browsing session")?;

    let options = PollOptions::from_settings(&settings);
    let poll_loop = PollLoop::new(browser, notifier, options, shutdown);
    poll_loop.run()?;

    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use listingwatch::config::{self, Settings};
use listingwatch::models::Listing;
use listingwatch::notify::{EmailNotifier, Notifier};

const TEST_SUBJECT: &str = "Test: Dummy Facebook Marketplace Ad";

#[derive(Parser, Debug)]
#[clap(author, version, about = "Send a dummy listing notification to check mail settings")]
struct Args {
    /// Path to config.json (defaults to the file next to the executable)
    #[clap(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let settings = Settings::load(&config_path)
        .with_context(|| format!("Could not load settings from {}", config_path.display()))?;

    let notifier = EmailNotifier::new(&settings.mail)?.with_subject(TEST_SUBJECT);
    let dummy = Listing::new(
        "https://www.facebook.com/marketplace/item/1234567890",
        "Dummy Product Title",
        "just now",
    );

    match notifier.notify(&[dummy]) {
        Ok(()) => println!("Dummy email sent to {}.", settings.mail.recipient),
        Err(e) => {
            eprintln!("Failed to send dummy email: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

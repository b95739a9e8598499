//! Watches a Facebook Marketplace search and emails every listing that shows
//! up within the configured number of minutes.

pub mod age;
pub mod browser;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod models;
pub mod notify;
pub mod parser;
pub mod poll;

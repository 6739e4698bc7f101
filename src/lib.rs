//! imdb-crawler - Sequential IMDb chart crawler
//!
//! Reads a chart page, visits each listed title and extracts a record per
//! title from embedded JSON-LD, falling back to the page markup.

pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod imdb;

pub use config::Config;
pub use error::FetchError;
pub use imdb::models::{DetailRecord, ListingItem, Metascore};

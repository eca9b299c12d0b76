//! Builds dating-profile material from a personal social-network data export: extracts facts
//! from the export, ranks photos and generates a profile description.

pub mod aggregate;
pub mod backends;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod scoring;
pub mod utils;

pub use aggregate::{aggregate, aggregate_on};
pub use config::Config;
pub use error::{Ignored, ProfileError, Result};
pub use models::{DatingProfileData, ParsedExportBundle, PhotoAnalysis, Sentiment, UserInfo};
pub use parser::ExportParser;
pub use pipeline::{BatchProgress, ModelManager};

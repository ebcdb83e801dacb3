//! Core module: configuration
//!
//! - [`Config`] - roster configuration loaded from the environment

pub mod config;

pub use config::{Config, MAX_BIRTHDAY_WINDOW_DAYS};

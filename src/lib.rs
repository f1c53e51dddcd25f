pub mod api;
pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod lark;
pub mod models;
pub mod report;

pub use error::{Error, Result};

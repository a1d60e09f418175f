#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod provider;
pub mod transcript;

pub use error::{Error, Result};

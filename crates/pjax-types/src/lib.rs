//! Foundation types for the PJAX navigator.
//!
//! Shared by every crate in the workspace: the error enum with its
//! `Result` alias, and the TOML-backed configuration.

pub mod config;
pub mod error;

pub use config::{HttpConfig, PageDefault, PjaxConfig};
pub use error::{PjaxError, Result};

//! Core types shared across the crate.
//!
//! - [`ComponentError`] - typed failures for configuration, validation and aggregation
//! - [`RenderError`] - breadcrumbed errors escaping a component render
//! - [`ErrorContext`] / [`user_friendly_error`] - colored CLI presentation with suggestions

pub mod error;

pub use error::{ComponentError, ErrorContext, RenderError, user_friendly_error};

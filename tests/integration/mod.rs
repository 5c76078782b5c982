//! Integration test suite for tera-components
//!
//! End-to-end tests over the public API: component trees rendered through the full
//! pipeline, aggregation of the resulting markers, the cache endpoint, the response
//! middleware, configuration loading and the `tcomp` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **render_pipeline**: Nested renders, error breadcrumbs, provide/inject, context behavior
//! - **aggregation**: Document and fragment output, placeholders, deduplication, failures
//! - **endpoint**: Cached asset serving
//! - **middleware**: Per-response aggregation
//! - **config**: `components.toml` discovery and validation
//! - **concurrency**: Renders sharing one environment across threads
//! - **cli**: The `tcomp` binary

mod aggregation;
mod cli;
mod concurrency;
mod config;
mod endpoint;
mod middleware;
mod render_pipeline;

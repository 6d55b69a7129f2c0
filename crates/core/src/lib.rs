//! Core library for restreport
//!
//! This crate implements the **Functional Core** of the restreport application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`restreport_core`** (this crate): Pure transformation functions with zero I/O
//! - **`restreport`**: HTTP requests, CLI and terminal output (the Imperative Shell)
//!
//! Every function here takes already-decoded API data and returns plain values,
//! so it can be tested with `serde_json::json!` fixtures and no HTTP server.
//!
//! # Module Organization
//!
//! - [`countries`]: REST Countries models, currency listing and filtering
//! - [`breweries`]: Open Brewery DB records and per-state aggregates
//! - [`pagination`]: Cursor for collections that end with an empty page
//! - [`serde_util`]: Decoders that default missing or malformed fields
//!
//! # Example Usage
//!
//! ```rust
//! use restreport_core::breweries::{type_counts_by_city, Brewery};
//!
//! let breweries = vec![Brewery {
//!     name: "Midnight Sun".to_string(),
//!     brewery_type: "micro".to_string(),
//!     city: "Anchorage".to_string(),
//!     ..Default::default()
//! }];
//!
//! let counts = type_counts_by_city(&breweries);
//! assert_eq!(counts["Anchorage"]["micro"], 1);
//! ```

pub mod breweries;
pub mod countries;
pub mod pagination;
pub mod serde_util;

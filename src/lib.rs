//! Library crate for org-divisions.
//!
//! This crate exposes the building blocks of the TUI:
//! - Division records and client-side enrichment (`model`)
//! - HTTP access to the divisions service (`api`)
//! - Column filters and sorting (`query`)
//! - Global free-text search (`search`)
//! - Application state and update loop (`app`)
//! - UI rendering and widgets (`ui`)
//! - Command-line entry points (`cli`)
//!
//! It is used by the `org-divisions` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod app;
pub mod cli;
pub mod error;
pub mod model;
pub mod query;
pub mod search;
pub mod ui;

/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};

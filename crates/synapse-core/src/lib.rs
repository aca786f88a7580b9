//! Core types and trait definitions for the Synapse sentiment service.
//!
//! Holds the subject, review and session records plus the [`store::SubjectStore`]
//! trait that every backend implements. No HTTP, model or database code
//! lives here.

// Store methods return `impl Future + Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod review;
pub mod store;
pub mod subject;

pub use error::{Error, Result};

//! Inforedact common types, geometry, and errors.
//!
//! This crate provides foundational types shared across the pipeline
//! crates:
//! - Page geometry and the layout-to-page coordinate transform
//! - Job and run identifiers
//! - Common error types

pub mod error;
pub mod geometry;
pub mod id;

pub use error::{Error, Result};
pub use geometry::{RawBBox, Rect};
pub use id::{JobId, RunId};

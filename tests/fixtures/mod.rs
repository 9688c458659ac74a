//! Test fixtures for load-planner.
//!
//! Provides realistic test data including:
//! - Real Ontario and Great Lakes city coordinates
//! - A builder for raw order records

#![allow(dead_code)]

pub mod cities;
pub mod orders;

pub use cities::*;
pub use orders::*;

//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup, geo math, pagination and helper functions.

pub mod errors;
pub mod logging;
pub mod helpers;
pub mod geo;
pub mod pagination;

pub use errors::{CollectivError, Result};

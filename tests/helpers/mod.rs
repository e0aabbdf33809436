//! Test helpers module
//!
//! Database containers, external service mocks, a wired test context and
//! data builders for the Collectiv integration tests.

#![allow(dead_code)]

pub mod database_helper;
pub mod external_mock;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use external_mock::*;
pub use test_context::*;
pub use test_data::*;

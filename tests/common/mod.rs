//! Common test utilities for wall-ingest integration tests

#[allow(dead_code)]
pub mod fixtures;
#[allow(dead_code)]
pub mod mock_api;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_api::*;

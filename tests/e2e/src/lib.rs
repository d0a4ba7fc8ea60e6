//! End-to-end test support for retain-core
//!
//! - [`harness`]: isolated stores of every strategy, wrapped in an engine
//! - [`mocks`]: realistic review, quiz and legacy-record data


pub use harness::{StoreKind, TestStoreManager, init_tracing};
pub use mocks::{BatchConfig, TestDataFactory};

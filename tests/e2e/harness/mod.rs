//! E2E test harness for folio.
//!
//! This module contains test infrastructure with intentionally unused builders,
//! variants, and methods that will be used as more e2e scenarios are written.

#![allow(dead_code)]

pub mod assertions;
pub mod clock;
pub mod records;
pub mod runner;
pub mod scenario;
pub mod steps;

// Re-export commonly used types
pub use assertions::Assertion;
pub use records::repo;
pub use scenario::Scenario;
pub use steps::RecordUpdate;

//! VisitWise Scenario Tests
//!
//! End-to-end checks of the billing and practice-state logic the zomes
//! delegate to. Each module builds a small practice and walks it through
//! the flows a practitioner actually performs.
//!
//! Run with: cargo test --manifest-path tests/Cargo.toml

pub mod billing;
pub mod directory;
pub mod fixtures;
pub mod import;
pub mod practice_flow;
pub mod visit_calendar;

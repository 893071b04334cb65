//! VisitWise Core - Visit Log and Billing Engine
//!
//! Pure Rust domain logic for independent practitioners who bill per visit:
//!
//! - Patient directory filtering and archiving
//! - Per-patient visit calendar (one visit per day)
//! - Payment ledger
//! - Oldest-first payment allocation (derived paid/unpaid status)
//! - Month-scoped and all-time earnings aggregation
//! - Media attachment paths, session persistence and contact deep links
//! - An application state container with pure reducers
//!
//! Nothing here touches the network; the zomes and the `visitwise` CLI
//! feed it data and render its results.
//!
//! # Example
//!
//! ```rust
//! use visitwise_core::{allocate_payments, PaymentStatus, Payment, PaymentMethod, Visit};
//! use chrono::NaiveDate;
//!
//! let jan = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let visits = vec![
//!     Visit::completed("v1", "p1", jan(1), 500),
//!     Visit::completed("v2", "p1", jan(3), 500),
//! ];
//! let payments = vec![Payment::new("pay1", "p1", 500, jan(5), PaymentMethod::Cash)];
//!
//! let allocation = allocate_payments(&visits, &payments, 0);
//! assert_eq!(allocation.status_of("v1"), Some(PaymentStatus::Paid));
//! assert_eq!(allocation.status_of("v2"), Some(PaymentStatus::Unpaid));
//! ```

pub mod allocation;
pub mod calendar;
pub mod config;
pub mod contact;
pub mod directory;
pub mod earnings;
pub mod error;
pub mod ledger;
pub mod media;
pub mod model;
pub mod session;
pub mod store;
pub mod validation;
pub mod visit_log;

// Re-export commonly used types for convenience
pub use allocation::{allocate_payments, Allocation, PaymentStatus};
pub use calendar::{parse_date, YearMonth};
pub use config::PracticeConfig;
pub use earnings::{
    patient_summary, practice_summary, practice_totals, EarningsTotals, EarningsWindow,
    PatientLedger, PatientSummary,
};
pub use error::VisitwiseError;
pub use model::{
    Amount, Gender, MediaItem, MediaKind, Patient, Payment, PaymentMethod, PracticeData,
    ReminderPreferences, Visit,
};
pub use store::{Action, AppState, Store};
pub use validation::{ValidationError, ValidationErrorCode, ValidationResult};

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, VisitwiseError>;

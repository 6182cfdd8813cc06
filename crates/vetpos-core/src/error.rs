//! # Error Types
//!
//! Domain errors for vetpos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  vetpos-core (this file)                                               │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vetpos-db                                                             │
//! │  └── DbError          - Database failures (wraps CoreError raised       │
//! │                         inside a transaction)                           │
//! │                                                                         │
//! │  clinic-api                                                            │
//! │  └── ApiError         - What the HTTP client sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → JSON          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale or drawer transaction needs an open drawer and there is none.
    #[error("No open cash drawer")]
    NoOpenDrawer,

    /// Only one drawer may be open at a time.
    #[error("A cash drawer is already open: {0}")]
    DrawerAlreadyOpen(String),

    /// The drawer exists but is already closed.
    #[error("Cash drawer {0} is not open")]
    DrawerNotOpen(String),

    #[error("Cash drawer not found: {0}")]
    DrawerNotFound(String),

    #[error("Inventory item not found: {0}")]
    ItemNotFound(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Selling or removing more units than are on hand.
    ///
    /// ```text
    /// Sale line: Antiparasitic x3
    ///      │
    ///      ▼
    /// Stock on hand: 2
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Antiparasitic", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Transaction rolls back, nothing is persisted
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    #[error("A sale needs at least one line")]
    EmptySale,

    #[error("A sale cannot have more than {max} lines")]
    TooManyLines { max: usize },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two mutually exclusive fields were both set, or neither was.
    #[error("exactly one of {first} or {second} must be set")]
    ExactlyOne { first: String, second: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

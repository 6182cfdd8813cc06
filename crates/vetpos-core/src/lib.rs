//! # vetpos-core: Pure Business Logic for VetPOS
//!
//! Everything the clinic's point of sale decides without touching a database:
//! money arithmetic, sale totals, drawer reconciliation, price adjustments,
//! receipt numbering and stock status rules.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        VetPOS Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web frontend (clinic staff)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    clinic-api (axum)                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vetpos-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │  sale   │ │ drawer  │ │ pricing │ │inventory│  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vetpos-db (SQLite)                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (InventoryItem, Sale, CashDrawer, ...)
//! - [`money`] - Integer-cent money type
//! - [`sale`] - Sale line validation and totals
//! - [`drawer`] - Expected amount / difference on drawer close
//! - [`pricing`] - Bulk price adjustment preview
//! - [`inventory`] - Stock status and movement ledger reconciliation
//! - [`receipt`] - Receipt number formatting
//! - [`validation`] - Field validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use vetpos_core::money::Money;
//! use vetpos_core::types::TaxRate;
//!
//! let consult = Money::from_cents(45_000); // $450.00
//! let tax = consult.calculate_tax(TaxRate::from_bps(1600)); // 16%
//! assert_eq!(tax.cents(), 7_200);
//! ```

pub mod drawer;
pub mod error;
pub mod inventory;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod sale;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum number of lines allowed on a single sale.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against typing 1000 instead of 10 at the counter.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Largest single amount accepted anywhere: unit prices, costs, drawer
/// counts, cash movements ($10,000,000.00).
///
/// Every total built from validated inputs stays far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000;

/// Largest quantity on hand or minimum stock level.
pub const MAX_STOCK_LEVEL: i64 = 1_000_000_000;

/// Name of the role that grants administrative operations.
pub const ADMIN_ROLE: &str = "admin";

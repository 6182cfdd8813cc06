//! # Repository Module
//!
//! Database repositories for VetPOS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  state.db.sales().create_sale(&new_sale, tax_rate)             │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create_sale(&self, sale, tax)     one transaction                 │
//! │  ├── get(&self, id)                                                    │
//! │  └── cancel_sale(&self, id, user)      one transaction                 │
//! │       │                                                                 │
//! │       │  helpers shared across repositories take a                     │
//! │       │  `&mut SqliteConnection` so they run inside the caller's tx    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`inventory::InventoryRepository`] - Items, movement ledger, price adjustments
//! - [`sale::SaleRepository`] - Transactional sale creation and cancellation
//! - [`cash_drawer::CashDrawerRepository`] - Drawer sessions and cash transactions
//! - [`service::ServiceRepository`] - Billable services
//! - [`user::UserRepository`] - Local identity mirror and roles

pub mod cash_drawer;
pub mod inventory;
pub mod sale;
pub mod service;
pub mod user;

//! # vetpos-db: Database Layer for VetPOS
//!
//! SQLite persistence via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  clinic-api handler (POST /api/sales)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vetpos-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ inventory, sale,   │  │ (embedded) │  │   │
//! │  │   │  SqlitePool   │    │ cash_drawer,       │  │            │  │   │
//! │  │   │               │    │ service, user      │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (vetpos.db, WAL)                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vetpos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("vetpos.db")).await?;
//! let drawer = db.cash_drawers().open(50_000, Some("user-1"), None).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Storage};

pub use repository::cash_drawer::{CashDrawerRepository, DrawerSummary};
pub use repository::inventory::{InventoryRepository, NewInventoryItem};
pub use repository::sale::SaleRepository;
pub use repository::service::{NewService, ServiceRepository};
pub use repository::user::UserRepository;

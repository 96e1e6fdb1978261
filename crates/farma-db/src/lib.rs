//! # farma-db: Storage Layer for FarmaPOS
//!
//! This crate provides database access for the FarmaPOS system, plus the
//! sale transaction engine. It uses SQLite for local storage with sqlx for
//! async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      FarmaPOS Data Flow                         │
//! │                                                                 │
//! │  Presentation layer call (list catalog, submit sale, ...)       │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                   farma-db (THIS CRATE)                   │  │
//! │  │                                                           │  │
//! │  │  ┌────────────┐  ┌──────────────┐  ┌───────────────────┐  │  │
//! │  │  │  Database  │  │ Repositories │  │    SaleEngine     │  │  │
//! │  │  │ (pool.rs)  │  │ product, lot │  │   (engine.rs)     │  │  │
//! │  │  │            │◄─│ sale,        │  │ one transaction:  │  │  │
//! │  │  │ SqlitePool │  │ operator     │  │ allocate + commit │  │  │
//! │  │  └────────────┘  └──────────────┘  └───────────────────┘  │  │
//! │  │         │                                                 │  │
//! │  │  ┌──────┴──────┐                                          │  │
//! │  │  │ Migrations  │ embedded 001_initial_schema.sql          │  │
//! │  │  └─────────────┘                                          │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  SQLite database file (WAL mode)                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration, and the catalog facade
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, lot, sale,
//!   operator)
//! - [`engine`] - The sale transaction engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chrono::Utc;
//! use farma_core::SalePolicy;
//! use farma_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("farmapos.db")).await?;
//!
//! // Catalog with stock and expiry-discounted prices
//! let catalog = db.list_products(Utc::now().date_naive()).await;
//!
//! // Submit a sale
//! let engine = db.engine(SalePolicy::new("farmacia_VS"));
//! let sale_id = engine.submit(&cart, operator_id, None, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::SaleEngine;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::lot::LotRepository;
pub use repository::operator::OperatorRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;

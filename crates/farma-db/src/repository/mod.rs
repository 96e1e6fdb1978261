//! # Repository Module
//!
//! Database repository implementations for FarmaPOS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Repository Pattern in FarmaPOS                     │
//! │                                                                 │
//! │  Presentation layer                                             │
//! │       │                                                         │
//! │       │  db.products().list_with_stock(today)                   │
//! │       ▼                                                         │
//! │  ProductRepository                                              │
//! │  ├── list_with_stock(today)                                     │
//! │  ├── get(id)                                                    │
//! │  ├── create(...) / update(...) / delete(id)                     │
//! │       │                                                         │
//! │       │  SQL                                                    │
//! │       ▼                                                         │
//! │  SQLite                                                         │
//! │                                                                 │
//! │  SQL stays in one place per entity; the FEFO and pricing rules  │
//! │  stay in farma-core, independent of the storage technology.     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - catalog CRUD and the stock-aggregated
//!   listing
//! - [`lot::LotRepository`] - lot intake, FEFO-ordered reads, expiry alert
//! - [`sale::SaleRepository`] - sale history reads (writes happen in the
//!   engine)
//! - [`operator::OperatorRepository`] - operator identities

pub mod lot;
pub mod operator;
pub mod product;
pub mod sale;

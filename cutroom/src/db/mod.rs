//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to keep queries out of the HTTP handlers.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (api::handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! Repositories borrow a `PgConnection`, so the caller decides whether a group of calls runs
//! inside a transaction:
//!
//! ```ignore
//! use cutroom::db::handlers::{PortfolioItems, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let before = PortfolioItems::new(&mut tx).get_by_id(id).await?;
//! let after = PortfolioItems::new(&mut tx).update(id, &request).await?;
//! tx.commit().await?;
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as`, so the crate compiles without a live
//! database. Schema lives in `migrations/`.

pub mod errors;
pub mod handlers;
pub mod models;

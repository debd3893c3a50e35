//! # atlas-db: Database Layer for Atlas
//!
//! This crate provides database access for the catalog.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas Catalog Data Flow                          │
//! │                                                                         │
//! │  Engine operation (convert, add_component, create_variant, ...)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     atlas-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐  ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │  │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │  │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo     │  │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CompositionRepo │  │ 001_initial  │  │   │
//! │  │   │ begin/acquire │    │ VariantRepo     │  │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └─────────────────┘  └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, composition, variant)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atlas_db::{Database, DbConfig, ProductRepository};
//!
//! let db = Database::new(DbConfig::new("catalog.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! let product = ProductRepository::require(&mut tx, &id).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::composition::{CompositionRepository, Owners};
pub use repository::product::ProductRepository;
pub use repository::variant::VariantRepository;

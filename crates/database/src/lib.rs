//! # Academia Database Crate
//!
//! The persistence layer for the academic records service: students,
//! professors, courses and enrollments.
//!
//! ## Architectural Principles
//!
//! - **One Query Contract:** [`AcademicStore`] names every read the API serves.
//!   Handlers hold an `Arc<dyn AcademicStore>` and never see SQL.
//! - **Two Backends:** [`DbRepository`] runs the contract against PostgreSQL
//!   through a pooled `sqlx` connection. [`InMemoryRepository`] runs the same
//!   contract over in-process vectors, for tests and database-less demos.
//! - **Audited Writes:** Both backends stamp creation and modification metadata
//!   through a `core_types::Auditor` on every insert.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool setup and the embedded schema.
//! - `AcademicStore`, `DbRepository`, `InMemoryRepository`: the query layer.
//! - `seed_demo_data`: loads a small demo catalog through the insert path.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod seed;
pub mod store;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryRepository;
pub use repository::DbRepository;
pub use seed::{seed_demo_data, SeedSummary};
pub use store::{constraint, AcademicStore};

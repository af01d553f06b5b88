//! Postgres-backed persistence for the bridge (spec §3, §4.4).
//!
//! Layout: [`pool`] owns the connection pool and runs migrations at
//! startup, [`uow`] provides the transactional [`uow::UnitOfWork`] that
//! every multi-row write goes through, [`error`] holds the repository
//! error taxonomy, and [`repositories`] holds one repository per entity
//! family (connection, factsheet, order execution, template).

pub mod error;
pub mod pool;
pub mod repositories;
pub mod uow;

pub use error::{RepoError, Result};
pub use pool::DbPool;
pub use repositories::{ConnectionRepository, FactsheetRepository, OrderExecutionRepository, Pagination, TemplateRepository};
pub use uow::{Tx, UnitOfWork};

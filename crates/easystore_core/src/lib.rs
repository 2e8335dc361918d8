//! Core persistence layer for EasyStore.
//!
//! Scalars and index-addressable lists live in two SQLite tables; a name-based
//! router decides which family a bare name refers to, and the snapshot/report
//! path dumps everything in the database, foreign tables included.

pub mod db;
pub mod logging;
pub mod model;
pub mod report;
pub mod router;
pub mod snapshot;
pub mod store;

pub use db::{DbError, DbResult, StoreOptions};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{ListItem, ScalarRecord};
pub use report::{render_report, ReportMeta, ReportOptions, SectionKind};
pub use router::{Attribute, Computed, ALL_DATA, HTML_REPORT};
pub use snapshot::{EntryOrigin, Snapshot, SnapshotEntry};
pub use store::{EasyStore, ListView, StoreError, StoreLocation, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

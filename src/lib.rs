// ABOUTME: Library root for dbreconcile
// ABOUTME: Exposes the diff/sync/migrate core consumed by the CLI and other presentation layers

pub mod commands;
pub mod diff;
pub mod error;
pub mod migrate;
pub mod mysql;
pub mod postgres;
pub mod state;
pub mod sync;
pub mod value;

pub use diff::{check_columns, diff_table, ColumnConsistencyResult, DiffResult, ModifiedPair};
pub use error::{Error, Result};
pub use migrate::{MappedColumn, MigrationOutcome};
pub use mysql::catalog::ColumnDescriptor;
pub use mysql::reader::TableSnapshot;
pub use mysql::ConnectionParams;
pub use sync::{
    ReconcileOptions, RecoveryAction, ReplaceOutcome, TableComparison, TableReconciliationOutcome,
};
pub use value::{Record, Value};

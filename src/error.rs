// ABOUTME: Error taxonomy for the reconciliation and migration core
// ABOUTME: Separates missing tables from other catalog failures so callers can branch on them

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// MySQL server error code for ER_NO_SUCH_TABLE.
const ER_NO_SUCH_TABLE: u16 = 1146;

/// Errors produced by the reconciliation and migration core.
///
/// Per-record and per-column failures inside bulk operations are not surfaced
/// through this type; they are captured as strings inside the operation's
/// outcome struct so one bad row never aborts the rest of the pass.
#[derive(Error, Debug)]
pub enum Error {
    /// Could not establish or validate a connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The named table does not exist on the queried server.
    #[error("table `{0}` does not exist")]
    TableMissing(String),

    /// A catalog query failed for a reason other than a missing table.
    #[error("catalog query failed for `{table}`: {message}")]
    Catalog { table: String, message: String },

    /// The table has no primary key, or a composite one; row diffing needs a
    /// single-column key.
    #[error("table `{0}` has no single-column primary key")]
    NoPrimaryKey(String),

    /// A malformed connection URL.
    #[error("invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("mysql error: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

impl Error {
    /// Classify a MySQL driver error raised while querying `table`.
    ///
    /// ER_NO_SUCH_TABLE becomes [`Error::TableMissing`]; everything else is
    /// wrapped as a catalog failure so callers can still see the table name.
    pub fn classify_mysql(table: &str, err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Server(ref server) if server.code == ER_NO_SUCH_TABLE => {
                Error::TableMissing(table.to_string())
            }
            other => Error::Catalog {
                table: table.to_string(),
                message: other.to_string(),
            },
        }
    }

    pub fn is_table_missing(&self) -> bool {
        matches!(self, Error::TableMissing(_))
    }
}

// ABOUTME: PostgreSQL connection helper and identifier quoting
// ABOUTME: Spawns the connection task and hands back the client

use tokio_postgres::{Client, NoTls};
use tracing::error;

use crate::error::{Error, Result};

/// Connect to PostgreSQL using a `postgres://` URL.
///
/// The connection task is spawned onto the runtime; its eventual error (if
/// any) is logged, and subsequent client calls fail with a driver error.
pub async fn connect(url: &str) -> Result<Client> {
    let (client, connection) = tokio_postgres::connect(url, NoTls)
        .await
        .map_err(|e| Error::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("postgres connection error: {e}");
        }
    });

    Ok(client)
}

/// Run a statement with no parameters, returning the affected row count.
pub async fn execute(client: &Client, sql: &str) -> Result<u64> {
    Ok(client.execute(sql, &[]).await?)
}

/// Quote a PostgreSQL identifier, doubling embedded double quotes.
pub fn quote_ident(identifier: &str) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push('"');
    for ch in identifier.chars() {
        if ch == '"' {
            quoted.push('"');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }
}

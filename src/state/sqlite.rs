use crate::state::error::StateError;
use crate::state::models::StoredResource;
use crate::state::state_store::StateStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task;
use tracing::{debug, error, info};

/// A SQLite implementation of the StateStore trait
pub struct SqliteStateStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStateStore {
    /// Open (or create) the state database at `db_path`; `:memory:` is accepted
    pub fn new(db_path: &str) -> Result<Self, StateError> {
        info!("Opening SQLite state store at path: {db_path}");

        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).map_err(|e| {
                    error!("Failed to create directory {parent:?}: {e}");
                    StateError::OpenError(format!("Failed to create directory: {e}"))
                })?;
            }
        }

        let connection = Connection::open(db_path).map_err(|e| {
            error!("Failed to open SQLite database at {db_path}: {e}");
            StateError::OpenError(format!("Failed to open SQLite database: {e}"))
        })?;

        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS buildpack_state (
                    name TEXT PRIMARY KEY,
                    guid TEXT NOT NULL,
                    filename TEXT NOT NULL DEFAULT '',
                    updated_at TEXT NOT NULL
                )",
                [],
            )
            .map_err(|e| {
                error!("Failed to create buildpack_state table: {e}");
                StateError::OpenError(format!("Failed to create buildpack_state table: {e}"))
            })?;

        Ok(SqliteStateStore {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, StateError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StateError::OperationError(format!("Failed to parse datetime: {e}")))
    }

    fn row_to_resource(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn into_resource(
        (name, guid, filename, updated_at): (String, String, String, String),
    ) -> Result<StoredResource, StateError> {
        Ok(StoredResource {
            name,
            guid,
            filename,
            updated_at: Self::string_to_datetime(&updated_at)?,
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_connection<T, F>(&self, what: &'static str, f: F) -> Result<T, StateError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StateError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        task::spawn_blocking(move || {
            let conn = connection.lock().map_err(|_| {
                error!("Failed to acquire database lock");
                StateError::Locked
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| {
            error!("Task panic while running {what}: {e}");
            StateError::OperationError(format!("Task panic: {e}"))
        })?
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(&self, name: &str) -> Result<Option<StoredResource>, StateError> {
        let name = name.to_string();
        let row = self
            .with_connection("load", move |conn| {
                conn.query_row(
                    "SELECT name, guid, filename, updated_at FROM buildpack_state WHERE name = ?1",
                    params![name],
                    Self::row_to_resource,
                )
                .optional()
                .map_err(|e| {
                    error!("Failed to load state for {name}: {e}");
                    StateError::OperationError(format!("Failed to load state: {e}"))
                })
            })
            .await?;

        row.map(Self::into_resource).transpose()
    }

    async fn save(&self, resource: StoredResource) -> Result<(), StateError> {
        debug!(
            "Saving state: name={}, guid={}, filename={}",
            resource.name, resource.guid, resource.filename
        );

        self.with_connection("save", move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO buildpack_state (name, guid, filename, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    resource.name,
                    resource.guid,
                    resource.filename,
                    resource.updated_at.to_rfc3339()
                ],
            )
            .map_err(|e| {
                error!("Failed to save state for {}: {e}", resource.name);
                StateError::OperationError(format!("Failed to save state: {e}"))
            })?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, name: &str) -> Result<(), StateError> {
        let name = name.to_string();
        self.with_connection("remove", move |conn| {
            conn.execute(
                "DELETE FROM buildpack_state WHERE name = ?1",
                params![name],
            )
            .map_err(|e| StateError::OperationError(format!("Failed to remove state: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn list(&self) -> Result<Vec<StoredResource>, StateError> {
        let rows = self
            .with_connection("list", |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT name, guid, filename, updated_at FROM buildpack_state ORDER BY name",
                    )
                    .map_err(|e| StateError::OperationError(format!("Failed to prepare: {e}")))?;
                let rows = stmt
                    .query_map([], Self::row_to_resource)
                    .map_err(|e| StateError::OperationError(format!("Failed to query: {e}")))?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(|e| StateError::OperationError(format!("Failed to read row: {e}")))?;
                Ok(rows)
            })
            .await?;

        rows.into_iter().map(Self::into_resource).collect()
    }

    async fn clear_all(&self) -> Result<(), StateError> {
        self.with_connection("clear_all", |conn| {
            conn.execute("DELETE FROM buildpack_state", [])
                .map_err(|e| StateError::OperationError(format!("Failed to clear state: {e}")))?;
            Ok(())
        })
        .await?;

        info!("Cleared all buildpack state");
        Ok(())
    }
}

//! SQLite storage backend for saved graphs

use super::traits::{GraphRepository, OpenStore, StorageError, StorageResult};
use crate::graph::{GraphDocument, GraphId, SavedGraph};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Raw column values of one `infrastructure_graphs` row
type GraphRow = (String, String, Option<String>, String, String, String);

const SELECT_GRAPH: &str = "SELECT id, name, description, data_json, created_at, updated_at
     FROM infrastructure_graphs";

/// SQLite-backed saved-graph store
///
/// One table holds every graph, with the document stored as JSON.
/// Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS infrastructure_graphs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                data_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_infrastructure_graphs_name
                ON infrastructure_graphs(name);

            -- Concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn read_row(row: &Row<'_>) -> rusqlite::Result<GraphRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn row_to_graph(row: GraphRow) -> StorageResult<SavedGraph> {
        let (id, name, description, data_json, created_at, updated_at) = row;
        let data: GraphDocument = serde_json::from_str(&data_json)?;
        Ok(SavedGraph {
            id: GraphId::from_string(id),
            name,
            description,
            data,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphRepository for SqliteStore {
    fn save_graph(&self, graph: &SavedGraph) -> StorageResult<()> {
        let data_json = serde_json::to_string(&graph.data)?;
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO infrastructure_graphs (id, name, description, data_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                data_json = excluded.data_json,
                updated_at = excluded.updated_at
            "#,
            params![
                graph.id.as_str(),
                graph.name,
                graph.description,
                data_json,
                graph.created_at.to_rfc3339(),
                graph.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn load_graph(&self, id: &GraphId) -> StorageResult<Option<SavedGraph>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("{SELECT_GRAPH} WHERE id = ?1"),
                params![id.as_str()],
                Self::read_row,
            )
            .optional()?;

        row.map(Self::row_to_graph).transpose()
    }

    fn delete_graph(&self, id: &GraphId) -> StorageResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM infrastructure_graphs WHERE id = ?1",
            params![id.as_str()],
        )?;
        Ok(rows > 0)
    }

    fn list_graphs(&self) -> StorageResult<Vec<SavedGraph>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_GRAPH} ORDER BY name, id"))?;
        let rows = stmt
            .query_map([], Self::read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::row_to_graph).collect()
    }
}

//! SQLite-backed document store.
//!
//! Documents are stored as JSON bodies in a single table, with the columns
//! needed for lookups (type, parent, version number) pulled out and indexed.

use rusqlite::{params, params_from_iter, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::traits::DocumentStore;
use crate::error::{InventoryError, Result};
use crate::models::{AssetDoc, DocId, RepresentationDoc, SubsetDoc, VersionDoc, VersionType};

const ASSET: &str = "asset";
const SUBSET: &str = "subset";
const VERSION: &str = "version";
const HERO_VERSION: &str = "hero_version";
const REPRESENTATION: &str = "representation";

/// SQLite document store.
pub struct SqliteStore {
    db_path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create or open a store at the given path.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InventoryError::io_with_path(e, parent))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;

        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::ensure_schema(&conn)?;
        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout=30000;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                doc_type TEXT NOT NULL,
                parent TEXT,
                version_number INTEGER,
                body_json TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_parent ON documents(doc_type, parent)",
            [],
        )?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn upsert_asset(&self, asset: &AssetDoc) -> Result<()> {
        self.upsert(&asset.id, ASSET, None, None, asset)
    }

    pub fn upsert_subset(&self, subset: &SubsetDoc) -> Result<()> {
        self.upsert(&subset.id, SUBSET, Some(&subset.parent), None, subset)
    }

    pub fn upsert_version(&self, version: &VersionDoc) -> Result<()> {
        let doc_type = match version.version_type {
            VersionType::Version => VERSION,
            VersionType::HeroVersion => HERO_VERSION,
        };
        self.upsert(&version.id, doc_type, Some(&version.parent), version.name, version)
    }

    pub fn upsert_representation(&self, repre: &RepresentationDoc) -> Result<()> {
        self.upsert(&repre.id, REPRESENTATION, Some(&repre.parent), None, repre)
    }

    /// Number of stored documents.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count)
    }

    fn upsert<T: Serialize>(
        &self,
        id: &str,
        doc_type: &str,
        parent: Option<&str>,
        version_number: Option<i64>,
        doc: &T,
    ) -> Result<()> {
        let body_json = serde_json::to_string(doc)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (id, doc_type, parent, version_number, body_json)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 doc_type=excluded.doc_type,
                 parent=excluded.parent,
                 version_number=excluded.version_number,
                 body_json=excluded.body_json",
            params![id, doc_type, parent, version_number, body_json],
        )?;
        debug!("Upserted {} document: {}", doc_type, id);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| InventoryError::Database {
            message: "Failed to acquire connection lock".to_string(),
            source: None,
        })
    }

    /// Select documents of the given types whose `column` is in `values`.
    fn select_in<T: DeserializeOwned>(
        &self,
        doc_types: &[&str],
        column: &str,
        values: &[DocId],
        order_by: &str,
    ) -> Result<Vec<T>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let type_placeholders: Vec<_> = doc_types.iter().map(|_| "?").collect();
        let value_placeholders: Vec<_> = values.iter().map(|_| "?").collect();
        let sql = format!(
            "SELECT body_json FROM documents WHERE doc_type IN ({}) AND {} IN ({}) ORDER BY {}",
            type_placeholders.join(","),
            column,
            value_placeholders.join(","),
            order_by
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let bind = doc_types
            .iter()
            .map(|t| t.to_string())
            .chain(values.iter().cloned());
        let rows = stmt.query_map(params_from_iter(bind), |row| row.get::<_, String>(0))?;

        let mut docs = Vec::new();
        for row in rows {
            let body = row?;
            match serde_json::from_str(&body) {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!("Skipping undecodable document row: {}", e),
            }
        }
        Ok(docs)
    }
}

impl DocumentStore for SqliteStore {
    fn assets(&self, ids: &[DocId]) -> Result<Vec<AssetDoc>> {
        self.select_in(&[ASSET], "id", ids, "id")
    }

    fn subsets(&self, ids: &[DocId]) -> Result<Vec<SubsetDoc>> {
        self.select_in(&[SUBSET], "id", ids, "id")
    }

    fn subsets_by_asset(&self, asset_ids: &[DocId]) -> Result<Vec<SubsetDoc>> {
        self.select_in(&[SUBSET], "parent", asset_ids, "id")
    }

    fn versions(&self, ids: &[DocId]) -> Result<Vec<VersionDoc>> {
        self.select_in(&[VERSION, HERO_VERSION], "id", ids, "id")
    }

    fn versions_by_subset(&self, subset_id: &str) -> Result<Vec<VersionDoc>> {
        self.select_in(
            &[VERSION],
            "parent",
            &[subset_id.to_string()],
            "version_number DESC",
        )
    }

    fn hero_versions_by_subset(&self, subset_ids: &[DocId]) -> Result<Vec<VersionDoc>> {
        self.select_in(&[HERO_VERSION], "parent", subset_ids, "id")
    }

    fn representations(&self, ids: &[DocId]) -> Result<Vec<RepresentationDoc>> {
        self.select_in(&[REPRESENTATION], "id", ids, "id")
    }

    fn representations_by_version(&self, version_ids: &[DocId]) -> Result<Vec<RepresentationDoc>> {
        self.select_in(&[REPRESENTATION], "parent", version_ids, "id")
    }
}

//! SQLite storage backend: `sqlite-vec` for KNN, FTS5 for full-text.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, OptionalExtension, ffi, rusqlite};
use tracing::debug;

use super::{Backend, ChildRecord, ChunkRecord, ParentHit, ParentRecord, SearchHit};
use crate::types::RagError;

/// SQLite-backed store for flat chunks and parent/child documents.
///
/// Opening the store creates the base tables. The search indexes are created
/// explicitly — call [`create_vector_index`](Self::create_vector_index) and
/// [`create_text_index`](Self::create_text_index) before ingesting flat
/// chunks, and [`create_graph_vector_index`](Self::create_graph_vector_index)
/// before ingesting parent/child documents.
#[derive(Clone)]
pub struct SqliteRagStore {
    conn: Connection,
    dimensions: usize,
}

impl SqliteRagStore {
    /// Opens (or creates) a store at `path` for vectors of `dimensions`.
    pub async fn open(path: impl AsRef<Path>, dimensions: usize) -> Result<Self, RagError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        let version = conn
            .call(|conn| -> rusqlite::Result<String> {
                Ok(conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))?)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        debug!(%version, "sqlite-vec ready");

        let store = Self { conn, dimensions };
        store.create_base_tables().await?;
        Ok(store)
    }

    /// Vector dimensionality this store was opened with.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn create_base_tables(&self) -> Result<(), RagError> {
        self.conn.call(|conn| -> rusqlite::Result<()> {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS chunks (
                     idx INTEGER PRIMARY KEY,
                     content TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS parents (
                     id TEXT PRIMARY KEY,
                     document_id TEXT NOT NULL,
                     section_id TEXT NOT NULL,
                     position INTEGER NOT NULL,
                     content TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_parents_document ON parents(document_id);
                 CREATE TABLE IF NOT EXISTS children (
                     id TEXT PRIMARY KEY,
                     parent_id TEXT NOT NULL,
                     position INTEGER NOT NULL,
                     content TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_children_parent ON children(parent_id);",
            )?;
            Ok(())
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }

    /// Creates the KNN index over flat-chunk embeddings.
    pub async fn create_vector_index(&self) -> Result<(), RagError> {
        let dimensions = self.dimensions;
        self.conn.call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                &format!(
                    "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_vec
                     USING vec0(embedding float[{dimensions}])"
                ),
                [],
            )?;
            Ok(())
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }

    /// Creates the full-text index over flat-chunk text.
    pub async fn create_text_index(&self) -> Result<(), RagError> {
        self.conn.call(|conn| -> rusqlite::Result<()> {
            conn.execute(
                "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(content)",
                [],
            )?;
            Ok(())
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }

    /// Creates the KNN index over child-chunk embeddings.
    pub async fn create_graph_vector_index(&self) -> Result<(), RagError> {
        let dimensions = self.dimensions;
        self.conn.call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                &format!(
                    "CREATE VIRTUAL TABLE IF NOT EXISTS children_vec
                     USING vec0(embedding float[{dimensions}])"
                ),
                [],
            )?;
            Ok(())
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }

    fn ensure_dimensions(&self, embedding: &[f32], what: &str) -> Result<(), RagError> {
        if embedding.len() != self.dimensions {
            return Err(RagError::Storage(format!(
                "{what} embedding has {} dimensions, store expects {}",
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for SqliteRagStore {
    async fn upsert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let mut rows = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            self.ensure_dimensions(&chunk.embedding, "chunk")?;
            let embedding = serde_json::to_string(&chunk.embedding)
                .map_err(|err| RagError::Storage(err.to_string()))?;
            rows.push((chunk.index as i64, chunk.text, embedding));
        }

        self.conn.call(move |conn| -> rusqlite::Result<()> {
            let tx = conn.transaction()?;
            for (idx, text, embedding) in rows {
                tx.execute(
                    "INSERT OR REPLACE INTO chunks (idx, content) VALUES (?1, ?2)",
                    (idx, &text),
                )?;
                tx.execute("DELETE FROM chunks_vec WHERE rowid = ?1", [idx])?;
                tx.execute(
                    "INSERT INTO chunks_vec (rowid, embedding) VALUES (?1, ?2)",
                    (idx, &embedding),
                )?;
                tx.execute("DELETE FROM chunks_fts WHERE rowid = ?1", [idx])?;
                tx.execute(
                    "INSERT INTO chunks_fts (rowid, content) VALUES (?1, ?2)",
                    (idx, &text),
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn search_similar(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, RagError> {
        let embedding = serde_json::to_string(query_embedding)
            .map_err(|err| RagError::Storage(err.to_string()))?;
        self.conn.call(move |conn| -> rusqlite::Result<Vec<SearchHit>> {
            let mut stmt = conn.prepare(
                "SELECT c.idx, c.content,
                        vec_distance_cosine(v.embedding, vec_f32(?1)) AS distance
                 FROM chunks c
                 JOIN chunks_vec v ON v.rowid = c.idx
                 ORDER BY distance ASC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map((&embedding, top_k as i64), |row| {
                let distance: f32 = row.get(2)?;
                Ok(SearchHit {
                    index: row.get::<_, i64>(0)? as usize,
                    text: row.get(1)?,
                    score: 1.0 - distance,
                })
            })?;
            let mut hits = Vec::new();
            for row in rows {
                hits.push(row?);
            }
            Ok(hits)
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn search_text(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, RagError> {
        let query = query.to_string();
        self.conn.call(move |conn| -> rusqlite::Result<Vec<SearchHit>> {
            let mut stmt = conn.prepare(
                // bm25 ranks are lower-is-better and negative; negate so the
                // score agrees with vector similarity about direction.
                "SELECT rowid, content, -bm25(chunks_fts) AS score
                 FROM chunks_fts
                 WHERE chunks_fts MATCH ?1
                 ORDER BY score DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map((&query, top_k as i64), |row| {
                Ok(SearchHit {
                    index: row.get::<_, i64>(0)? as usize,
                    text: row.get(1)?,
                    score: row.get(2)?,
                })
            })?;
            let mut hits = Vec::new();
            for row in rows {
                hits.push(row?);
            }
            Ok(hits)
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn insert_document(
        &self,
        parent: ParentRecord,
        children: Vec<ChildRecord>,
    ) -> Result<(), RagError> {
        let mut child_rows = Vec::with_capacity(children.len());
        for child in children {
            self.ensure_dimensions(&child.embedding, "child chunk")?;
            let embedding = serde_json::to_string(&child.embedding)
                .map_err(|err| RagError::Storage(err.to_string()))?;
            child_rows.push((child.id, child.parent_id, child.position as i64, child.text, embedding));
        }

        self.conn.call(move |conn| -> rusqlite::Result<()> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR REPLACE INTO parents (id, document_id, section_id, position, content)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &parent.id,
                    &parent.document_id,
                    &parent.section_id,
                    parent.position as i64,
                    &parent.text,
                ),
            )?;
            for (id, parent_id, position, text, embedding) in child_rows {
                let stale: Option<i64> = tx
                    .query_row("SELECT rowid FROM children WHERE id = ?1", [&id], |row| {
                        row.get(0)
                    })
                    .optional()?;
                if let Some(rowid) = stale {
                    tx.execute("DELETE FROM children_vec WHERE rowid = ?1", [rowid])?;
                    tx.execute("DELETE FROM children WHERE rowid = ?1", [rowid])?;
                }
                tx.execute(
                    "INSERT INTO children (id, parent_id, position, content) VALUES (?1, ?2, ?3, ?4)",
                    (&id, &parent_id, position, &text),
                )?;
                let rowid = tx.last_insert_rowid();
                tx.execute(
                    "INSERT INTO children_vec (rowid, embedding) VALUES (?1, ?2)",
                    (rowid, &embedding),
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn search_parents(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ParentHit>, RagError> {
        let embedding = serde_json::to_string(query_embedding)
            .map_err(|err| RagError::Storage(err.to_string()))?;
        self.conn.call(move |conn| -> rusqlite::Result<Vec<ParentHit>> {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.content,
                        MAX(1.0 - vec_distance_cosine(v.embedding, vec_f32(?1))) AS score
                 FROM children ch
                 JOIN children_vec v ON v.rowid = ch.rowid
                 JOIN parents p ON p.id = ch.parent_id
                 GROUP BY p.id, p.content
                 ORDER BY score DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map((&embedding, top_k as i64), |row| {
                Ok(ParentHit {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    score: row.get(2)?,
                })
            })?;
            let mut hits = Vec::new();
            for row in rows {
                hits.push(row?);
            }
            Ok(hits)
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn count_chunks(&self) -> Result<usize, RagError> {
        self.conn.call(|conn| -> rusqlite::Result<usize> {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))
    }
}

/// Registers the sqlite-vec extension for every connection opened afterwards.
///
/// Registration happens once per process; later calls replay the first
/// outcome.
fn register_sqlite_vec() -> Result<(), RagError> {
    use std::sync::Mutex;

    static INIT: Once = Once::new();
    static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != 0 {
                Err(format!(
                    "failed to register sqlite-vec extension (code {rc})"
                ))
            } else {
                Ok(())
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .expect("init was called but result not set")
        .map_err(RagError::Storage)
}

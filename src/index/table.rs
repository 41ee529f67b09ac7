//! LanceDB chunk table: schema management, batched upsert, and
//! nearest-neighbor search.

use crate::error::{EmbeddingError, Result, StoreError};
use crate::index::models::{ChunkRecord, RetrievedChunk};
use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use arrow_array::types::Float32Type;
use futures::TryStreamExt;
use std::sync::Arc;

/// Storage contract shared by the ingestion pipeline and the query engine.
///
/// Writes are at-least-once: a batch either lands whole or errors, and
/// previously written batches stay indexed. Search results come back in
/// the store's similarity order and are not re-ranked here.
#[async_trait::async_trait]
pub trait ChunkStore: Send + Sync {
    /// Write a batch of chunk records, replacing any rows with the same ids.
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<()>;

    /// Nearest-neighbor search over the vector column, returning only the
    /// content and source of the top `k` hits.
    async fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>>;

    /// Total number of indexed chunks.
    async fn count(&self) -> Result<usize>;
}

/// LanceDB-backed chunk store.
pub struct LanceChunkStore {
    table: lancedb::Table,
    dimensions: usize,
}

impl LanceChunkStore {
    /// Open the chunk table, creating it if absent.
    ///
    /// Creation is idempotent: a concurrent creator losing the race falls
    /// back to opening the table another process just created. If the
    /// table exists but is unreadable (e.g. process killed mid-write), it
    /// is dropped and recreated.
    pub async fn open_or_create(
        connection: &lancedb::Connection,
        table_name: &str,
        dimensions: usize,
    ) -> Result<Self> {
        match connection.open_table(table_name).execute().await {
            Ok(table) => return Ok(Self { table, dimensions }),
            Err(error) => {
                tracing::debug!(%error, table_name, "failed to open chunk table, will create");
            }
        }

        match Self::create_empty_table(connection, table_name, dimensions).await {
            Ok(table) => return Ok(Self { table, dimensions }),
            Err(error) => {
                tracing::debug!(%error, table_name, "create failed, retrying open");
            }
        }

        // Lost the creation race, or the table data is corrupted. Try the
        // open once more before dropping and recreating from scratch.
        if let Ok(table) = connection.open_table(table_name).execute().await {
            return Ok(Self { table, dimensions });
        }

        if let Err(error) = connection.drop_table(table_name, &[]).await {
            tracing::warn!(%error, "drop_table failed during recovery, proceeding anyway");
        }

        let table = Self::create_empty_table(connection, table_name, dimensions).await?;
        tracing::info!(table_name, "chunk table recovered — documents will need re-ingestion");

        Ok(Self { table, dimensions })
    }

    async fn create_empty_table(
        connection: &lancedb::Connection,
        table_name: &str,
        dimensions: usize,
    ) -> Result<lancedb::Table> {
        let schema = Self::schema(dimensions);
        let batches = RecordBatchIterator::new(vec![].into_iter().map(Ok), Arc::new(schema));

        connection
            .create_table(table_name, Box::new(batches))
            .execute()
            .await
            .map_err(|e| StoreError::LanceDb(e.to_string()).into())
    }

    /// Create the ANN index on the vector column, tolerating a pre-existing
    /// index. Called after writes land rather than unconditionally at
    /// startup: LanceDB cannot train an index on an empty table. Search
    /// falls back to a flat scan until the index exists.
    pub async fn create_index(&self) -> Result<()> {
        match self
            .table
            .create_index(&["vector"], lancedb::index::Index::Auto)
            .execute()
            .await
        {
            Ok(()) => {
                tracing::debug!("vector index created on vector column");
                Ok(())
            }
            Err(error) => {
                let message = error.to_string();
                if message.contains("already") || message.contains("index") {
                    tracing::trace!("vector index already exists");
                    Ok(())
                } else {
                    Err(StoreError::LanceDb(format!("failed to create vector index: {message}"))
                        .into())
                }
            }
        }
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            }
            .into());
        }
        Ok(())
    }

    fn schema(dimensions: usize) -> arrow_schema::Schema {
        arrow_schema::Schema::new(vec![
            arrow_schema::Field::new("id", arrow_schema::DataType::Utf8, false),
            arrow_schema::Field::new("content", arrow_schema::DataType::Utf8, false),
            arrow_schema::Field::new("source", arrow_schema::DataType::Utf8, false),
            arrow_schema::Field::new(
                "vector",
                arrow_schema::DataType::FixedSizeList(
                    Arc::new(arrow_schema::Field::new(
                        "item",
                        arrow_schema::DataType::Float32,
                        true,
                    )),
                    dimensions as i32,
                ),
                false,
            ),
        ])
    }
}

#[async_trait::async_trait]
impl ChunkStore for LanceChunkStore {
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        for record in records {
            self.check_dimensions(&record.vector)?;
        }

        // Ids are deterministic from (source, ordinal), so re-ingesting a
        // document must replace rather than accumulate rows.
        let quoted_ids = records
            .iter()
            .map(|r| format!("'{}'", r.id.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(", ");
        self.table
            .delete(&format!("id IN ({quoted_ids})"))
            .await
            .map_err(|e| StoreError::LanceDb(e.to_string()))?;

        let schema = Self::schema(self.dimensions);

        let id_array = StringArray::from_iter_values(records.iter().map(|r| r.id.as_str()));
        let content_array =
            StringArray::from_iter_values(records.iter().map(|r| r.content.as_str()));
        let source_array = StringArray::from_iter_values(records.iter().map(|r| r.source.as_str()));
        let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            records
                .iter()
                .map(|r| Some(r.vector.iter().map(|v| Some(*v)).collect::<Vec<_>>())),
            self.dimensions as i32,
        );

        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(id_array) as arrow_array::ArrayRef,
                Arc::new(content_array) as arrow_array::ArrayRef,
                Arc::new(source_array) as arrow_array::ArrayRef,
                Arc::new(vector_array) as arrow_array::ArrayRef,
            ],
        )
        .map_err(|e| StoreError::LanceDb(e.to_string()))?;

        let batches =
            RecordBatchIterator::new(vec![Ok(batch)], Arc::new(Self::schema(self.dimensions)));

        self.table
            .add(Box::new(batches))
            .execute()
            .await
            .map_err(|e| StoreError::LanceDb(e.to_string()))?;

        Ok(())
    }

    async fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        self.check_dimensions(query_vector)?;

        use lancedb::query::{ExecutableQuery, QueryBase};

        let results: Vec<RecordBatch> = self
            .table
            .query()
            .nearest_to(query_vector)
            .map_err(|e| StoreError::LanceDb(e.to_string()))?
            .select(lancedb::query::Select::columns(&["content", "source"]))
            .limit(k)
            .execute()
            .await
            .map_err(|e| StoreError::LanceDb(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| StoreError::LanceDb(e.to_string()))?;

        let mut hits = Vec::new();
        for batch in results {
            if let (Some(content_col), Some(source_col)) = (
                batch.column_by_name("content"),
                batch.column_by_name("source"),
            ) {
                let contents: &StringArray = content_col.as_string::<i32>();
                let sources: &StringArray = source_col.as_string::<i32>();

                for i in 0..contents.len() {
                    if contents.is_valid(i) && sources.is_valid(i) {
                        hits.push(RetrievedChunk {
                            content: contents.value(i).to_string(),
                            source: sources.value(i).to_string(),
                        });
                    }
                }
            }
        }

        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        use lancedb::query::{ExecutableQuery, QueryBase};

        let results: Vec<RecordBatch> = self
            .table
            .query()
            .select(lancedb::query::Select::columns(&["id"]))
            .execute()
            .await
            .map_err(|e| StoreError::LanceDb(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| StoreError::LanceDb(e.to_string()))?;

        Ok(results.iter().map(|b| b.num_rows()).sum())
    }
}

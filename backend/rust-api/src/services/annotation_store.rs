use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client as MongoClient, Collection, Database, IndexModel};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::errors::StoreError;
use crate::metrics::track_store_operation;
use crate::models::{AnnotationRecord, RowId};

/// MongoDB duplicate key error code
const DUPLICATE_KEY_CODE: i32 = 11000;

const UNIQUE_INDEX_NAME: &str = "teacher_dataset_row_unique";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record for the same (teacher, dataset, row) already exists
    Duplicate,
}

/// Shared table of annotations, unique per (teacher, dataset, row)
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn insert_annotation(&self, record: &AnnotationRecord)
        -> Result<InsertOutcome, StoreError>;

    async fn query_annotated_rows(
        &self,
        teacher_name: &str,
        dataset_name: &str,
    ) -> Result<BTreeSet<RowId>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}

pub struct MongoAnnotationStore {
    database: Database,
    collection_name: String,
}

impl MongoAnnotationStore {
    pub async fn connect(
        uri: &str,
        database: &str,
        collection_name: &str,
    ) -> Result<Self, StoreError> {
        let client = MongoClient::with_uri_str(uri).await?;
        let store = Self {
            database: client.database(database),
            collection_name: collection_name.to_string(),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Creates the unique (teacher_name, dataset_name, row_index) index the
    /// duplicate-tolerant insert relies on. Idempotent.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "teacher_name": 1, "dataset_name": 1, "row_index": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(UNIQUE_INDEX_NAME.to_string())
                    .build(),
            )
            .build();

        self.records().create_index(index).await?;
        tracing::info!(
            "Unique annotation index ensured on collection {}",
            self.collection_name
        );
        Ok(())
    }

    fn records(&self) -> Collection<AnnotationRecord> {
        self.database.collection(&self.collection_name)
    }

    fn documents(&self) -> Collection<Document> {
        self.database.collection(&self.collection_name)
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn row_index_of(document: &Document) -> Option<RowId> {
    match document.get("row_index") {
        Some(Bson::Int32(value)) => Some(*value as RowId),
        Some(Bson::Int64(value)) => Some(*value),
        Some(Bson::Double(value)) if value.fract() == 0.0 => Some(*value as RowId),
        _ => None,
    }
}

#[async_trait]
impl AnnotationStore for MongoAnnotationStore {
    async fn insert_annotation(
        &self,
        record: &AnnotationRecord,
    ) -> Result<InsertOutcome, StoreError> {
        track_store_operation("insert_annotation", "mongo", async {
            match self.records().insert_one(record).await {
                Ok(_) => Ok(InsertOutcome::Inserted),
                Err(e) if is_duplicate_key(&e) => Ok(InsertOutcome::Duplicate),
                Err(e) => Err(StoreError::Mongo(e)),
            }
        })
        .await
    }

    async fn query_annotated_rows(
        &self,
        teacher_name: &str,
        dataset_name: &str,
    ) -> Result<BTreeSet<RowId>, StoreError> {
        track_store_operation("query_annotated_rows", "mongo", async {
            let mut cursor = self
                .documents()
                .find(doc! { "teacher_name": teacher_name, "dataset_name": dataset_name })
                .projection(doc! { "row_index": 1, "_id": 0 })
                .await?;

            let mut rows = BTreeSet::new();
            while cursor.advance().await? {
                let document = cursor.deserialize_current()?;
                match row_index_of(&document) {
                    Some(row_id) => {
                        rows.insert(row_id);
                    }
                    None => tracing::warn!(
                        teacher = teacher_name,
                        dataset = dataset_name,
                        "Skipping annotation with unusable row_index"
                    ),
                }
            }
            Ok::<_, StoreError>(rows)
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongo"
    }
}

/// Process-local annotation store with the same uniqueness semantics
#[derive(Default)]
pub struct MemoryAnnotationStore {
    records: Mutex<Vec<AnnotationRecord>>,
    fail_queries: AtomicBool,
    fail_inserts: AtomicBool,
}

impl MemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `query_annotated_rows` calls fail, simulating an outage
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `insert_annotation` calls fail, simulating an outage
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<AnnotationRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AnnotationStore for MemoryAnnotationStore {
    async fn insert_annotation(
        &self,
        record: &AnnotationRecord,
    ) -> Result<InsertOutcome, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated insert failure".to_string()));
        }

        let mut records = self.lock()?;
        let exists = records.iter().any(|existing| {
            existing.teacher_name == record.teacher_name
                && existing.dataset_name == record.dataset_name
                && existing.row_index == record.row_index
        });
        if exists {
            return Ok(InsertOutcome::Duplicate);
        }
        records.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn query_annotated_rows(
        &self,
        teacher_name: &str,
        dataset_name: &str,
    ) -> Result<BTreeSet<RowId>, StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated query failure".to_string()));
        }

        Ok(self
            .lock()?
            .iter()
            .filter(|r| r.teacher_name == teacher_name && r.dataset_name == dataset_name)
            .map(|r| r.row_index)
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

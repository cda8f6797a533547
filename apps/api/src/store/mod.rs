//! Document store abstraction.
//!
//! Every collection holds schemaless JSON documents keyed by a store-assigned
//! string id. Handlers and the agent trigger service only ever see the
//! `DocumentStore` trait; `AppState` carries an `Arc<dyn DocumentStore>`
//! chosen at startup (Postgres when `DATABASE_URL` is set, memory otherwise).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::clock;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Collection names shared by handlers and the result dispatcher.
pub mod collections {
    pub const CHAT_SESSIONS: &str = "chatSessions";
    pub const CAREER_PLANS: &str = "careerplans";
    pub const ROADMAPS: &str = "roadmaps";
    pub const RESUME_ANALYSES: &str = "resumeanalyses";
    pub const JOB_MATCHES: &str = "jobmatches";
    pub const AGENT_EXECUTIONS: &str = "agentexecutions";
    pub const USERS: &str = "users";
}

pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("Document {collection}/{id} is not a JSON object")]
    Corrupt { collection: String, id: String },
}

/// A stored document: its id plus the field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// The document as returned to API clients: `{ "id": ..., ...fields }`.
    pub fn into_json(self) -> Value {
        let mut merged = Map::with_capacity(self.data.len() + 1);
        merged.insert("id".to_string(), Value::String(self.id));
        merged.extend(self.data);
        Value::Object(merged)
    }

    /// Decodes the id-merged document into a typed model.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.into_json())?)
    }
}

/// Sorts documents newest first by the first timestamp field present on each
/// (e.g. `["updatedAt", "createdAt"]`). Stores are never asked to order
/// results, so no compound index is needed.
pub fn sort_newest_first(docs: &mut [Document], fields: &[&str]) {
    let key = |doc: &Document| clock::sort_key(fields.iter().find_map(|f| doc.get_str(f)));
    docs.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// Where-equals filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn matches(&self, data: &Fields) -> bool {
        data.get(&self.field) == Some(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        collection: String,
        id: String,
        data: Fields,
    },
    Update {
        collection: String,
        id: String,
        patch: Fields,
    },
}

/// Multi-document write committed as one unit.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a new document under a freshly generated id and returns that id.
    pub fn set(&mut self, collection: &str, data: Fields) -> String {
        let id = new_document_id();
        self.ops.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.clone(),
            data,
        });
        id
    }

    pub fn update(&mut self, collection: &str, id: &str, patch: Fields) {
        self.ops.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
        });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

pub fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Converts a serializable model into a field map for writing.
pub fn to_fields<T: serde::Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// All documents matching every filter. `limit` caps the result count;
    /// ordering is unspecified, callers sort in memory.
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Inserts a document under a new id and returns that id.
    async fn add(&self, collection: &str, data: Fields) -> Result<String, StoreError>;

    /// Shallow-merges `patch` into an existing document.
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Applies every queued write or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

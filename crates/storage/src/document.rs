use chrono::{DateTime, Utc};
use liftlog_domain as domain;
use serde_json::{Map, Value};
use strum::AsRefStr;
use thiserror::Error;

pub const DOCUMENT_ID: &str = "$id";
pub const CREATED_AT: &str = "$createdAt";

/// A stored document together with the metadata maintained by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub created: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(&'static str, Value),
    AnyOf(&'static str, Vec<Value>),
    OrderAsc(&'static str),
    OrderDesc(&'static str),
    Limit(usize),
    Offset(usize),
}

#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    #[strum(serialize = "exercises")]
    Exercises,
    #[strum(serialize = "workouts")]
    Workouts,
    #[strum(serialize = "workout_exercises")]
    WorkoutExercises,
}

/// Minimal interface to a document database. Collection ids are resolved by
/// the caller.
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Send + Sync + 'static {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Document>, StoreError>;
    async fn get_document(&self, collection: &str, id: &str) -> Result<Document, StoreError>;
    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError>;
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError>;
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] domain::StorageError),
}

impl From<StoreError> for domain::ReadError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Self::NotFound,
            StoreError::Storage(storage) => Self::Storage(storage),
        }
    }
}

impl From<StoreError> for domain::CreateError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Self::Other("document not found".into()),
            StoreError::Storage(storage) => Self::Storage(storage),
        }
    }
}

impl From<StoreError> for domain::UpdateError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Self::NotFound,
            StoreError::Storage(storage) => Self::Storage(storage),
        }
    }
}

impl From<StoreError> for domain::DeleteError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Self::NotFound,
            StoreError::Storage(storage) => Self::Storage(storage),
        }
    }
}

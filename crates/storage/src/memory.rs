use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicI64, AtomicUsize, Ordering::Relaxed},
    },
};

use chrono::{DateTime, Duration, Utc};
use liftlog_domain as domain;
use serde_json::{Map, Value, json};

use crate::document::{CREATED_AT, DOCUMENT_ID, Document, DocumentStore, Query, StoreError};

/// Document store backed by process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<State>,
}

#[derive(Default)]
struct State {
    collections: Mutex<BTreeMap<String, Vec<Document>>>,
    fetches: AtomicUsize,
    ticks: AtomicI64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read requests served so far.
    #[must_use]
    pub fn fetches(&self) -> usize {
        self.state.fetches.load(Relaxed)
    }

    fn collections(&self) -> MutexGuard<'_, BTreeMap<String, Vec<Document>>> {
        self.state
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // Successive creations must end up with distinct creation times even if
    // the clock does not advance between them.
    fn created(&self) -> DateTime<Utc> {
        Utc::now() + Duration::nanoseconds(self.state.ticks.fetch_add(1, Relaxed))
    }
}

impl DocumentStore for MemoryStore {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Document>, StoreError> {
        self.state.fetches.fetch_add(1, Relaxed);

        let mut documents = self
            .collections()
            .get(collection)
            .cloned()
            .unwrap_or_default();

        documents.retain(|document| queries.iter().all(|query| matches(document, query)));

        for query in queries.iter().rev() {
            match query {
                Query::OrderAsc(attribute) => {
                    documents.sort_by(|a, b| compare(a, b, attribute));
                }
                Query::OrderDesc(attribute) => {
                    documents.sort_by(|a, b| compare(b, a, attribute));
                }
                _ => {}
            }
        }

        let offset = queries
            .iter()
            .find_map(|query| match query {
                Query::Offset(offset) => Some(*offset),
                _ => None,
            })
            .unwrap_or(0);
        let limit = queries
            .iter()
            .find_map(|query| match query {
                Query::Limit(limit) => Some(*limit),
                _ => None,
            })
            .unwrap_or(usize::MAX);

        Ok(documents.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        self.state.fetches.fetch_add(1, Relaxed);

        self.collections()
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| document.id == id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let created = self.created();
        let mut collections = self.collections();
        let documents = collections.entry(collection.to_string()).or_default();

        if documents.iter().any(|document| document.id == id) {
            return Err(StoreError::Storage(domain::StorageError::Rejected(409)));
        }

        let document = Document {
            id: id.to_string(),
            created,
            fields,
        };
        documents.push(document.clone());

        Ok(document)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections();
        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|document| document.id == id))
            .ok_or(StoreError::NotFound)?;

        document.fields.extend(fields);

        Ok(document.clone())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections();
        let documents = collections
            .get_mut(collection)
            .ok_or(StoreError::NotFound)?;
        let len = documents.len();

        documents.retain(|document| document.id != id);

        if documents.len() == len {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

fn field_value(document: &Document, attribute: &str) -> Option<Value> {
    match attribute {
        DOCUMENT_ID => Some(json!(document.id)),
        CREATED_AT => Some(json!(document.created)),
        _ => document.fields.get(attribute).cloned(),
    }
}

fn matches(document: &Document, query: &Query) -> bool {
    match query {
        Query::Equal(attribute, value) => field_value(document, attribute).as_ref() == Some(value),
        Query::AnyOf(attribute, values) => {
            field_value(document, attribute).is_some_and(|value| values.contains(&value))
        }
        Query::OrderAsc(_) | Query::OrderDesc(_) | Query::Limit(_) | Query::Offset(_) => true,
    }
}

fn compare(a: &Document, b: &Document, attribute: &str) -> Ordering {
    if attribute == CREATED_AT {
        return a.created.cmp(&b.created);
    }

    match (field_value(a, attribute), field_value(b, attribute)) {
        (Some(a), Some(b)) => compare_values(&a, &b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

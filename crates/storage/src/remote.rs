//! Remote document store
//!
//! Documents are read from and written to a remote document database via its
//! HTTP API. The project and database ids from the configuration determine
//! which database is addressed.

use chrono::{DateTime, Utc};
use liftlog_domain as domain;
use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::{
    config::StoreConfig,
    document::{Document, DocumentStore, Query, StoreError},
};

const PROJECT_HEADER: &str = "X-Appwrite-Project";

#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    pub status: u16,
    pub body: Value,
}

#[allow(async_fn_in_trait)]
pub trait SendRequest: Send + Sync + 'static {
    async fn send_request(
        &self,
        request: StoreRequest,
    ) -> Result<StoreResponse, domain::StorageError>;
}

/// Sends requests over HTTP with a shared client.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &StoreConfig) -> Result<Self, domain::StorageError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| domain::StorageError::Other(Box::new(err)))?;

        Ok(Self { client })
    }
}

impl SendRequest for HttpTransport {
    async fn send_request(
        &self,
        request: StoreRequest,
    ) -> Result<StoreResponse, domain::StorageError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(request_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(request_error)?;

        Ok(StoreResponse {
            status,
            body: serde_json::from_str(&text).unwrap_or(Value::Null),
        })
    }
}

fn request_error(err: reqwest::Error) -> domain::StorageError {
    if err.is_timeout() {
        domain::StorageError::Timeout
    } else if err.is_connect() {
        domain::StorageError::NoConnection
    } else {
        domain::StorageError::Other(Box::new(err))
    }
}

#[derive(Clone)]
pub struct RemoteStore<S: SendRequest = HttpTransport> {
    pub sender: S,
    pub config: StoreConfig,
}

impl RemoteStore<HttpTransport> {
    pub fn new(config: StoreConfig) -> Result<Self, domain::StorageError> {
        Ok(Self {
            sender: HttpTransport::new(&config)?,
            config,
        })
    }
}

impl<S: SendRequest> RemoteStore<S> {
    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/databases/{}/collections/{collection}/documents",
            self.config.endpoint, self.config.database_id
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{id}", self.documents_url(collection))
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> Result<StoreResponse, StoreError> {
        Ok(self
            .sender
            .send_request(StoreRequest {
                method,
                url,
                headers: vec![(PROJECT_HEADER.to_string(), self.config.project_id.clone())],
                body,
            })
            .await?)
    }
}

impl<S: SendRequest> DocumentStore for RemoteStore<S> {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Document>, StoreError> {
        let mut url = reqwest::Url::parse(&self.documents_url(collection))
            .map_err(|err| domain::StorageError::Other(Box::new(err)))?;
        for query in queries {
            url.query_pairs_mut()
                .append_pair("queries[]", &encode_query(query).to_string());
        }

        let response = self.send(Method::GET, url.to_string(), None).await?;
        match response.status {
            200..=299 => Ok(decode::<ListEnvelope>(response.body)?
                .documents
                .into_iter()
                .map(Document::from)
                .collect()),
            status => Err(domain::StorageError::Rejected(status).into()),
        }
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let response = self
            .send(Method::GET, self.document_url(collection, id), None)
            .await?;
        match response.status {
            200..=299 => Ok(decode::<DocumentEnvelope>(response.body)?.into()),
            404 => Err(StoreError::NotFound),
            status => Err(domain::StorageError::Rejected(status).into()),
        }
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let body = json!({
            "documentId": id,
            "data": fields,
        });
        let response = self
            .send(Method::POST, self.documents_url(collection), Some(body))
            .await?;
        match response.status {
            200..=299 => Ok(decode::<DocumentEnvelope>(response.body)?.into()),
            status => Err(domain::StorageError::Rejected(status).into()),
        }
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let body = json!({ "data": fields });
        let response = self
            .send(Method::PATCH, self.document_url(collection, id), Some(body))
            .await?;
        match response.status {
            200..=299 => Ok(decode::<DocumentEnvelope>(response.body)?.into()),
            404 => Err(StoreError::NotFound),
            status => Err(domain::StorageError::Rejected(status).into()),
        }
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .send(Method::DELETE, self.document_url(collection, id), None)
            .await?;
        match response.status {
            200..=299 => Ok(()),
            404 => Err(StoreError::NotFound),
            status => Err(domain::StorageError::Rejected(status).into()),
        }
    }
}

fn encode_query(query: &Query) -> Value {
    match query {
        Query::Equal(attribute, value) => json!({
            "method": "equal",
            "attribute": attribute,
            "values": [value],
        }),
        Query::AnyOf(attribute, values) => json!({
            "method": "equal",
            "attribute": attribute,
            "values": values,
        }),
        Query::OrderAsc(attribute) => json!({
            "method": "orderAsc",
            "attribute": attribute,
        }),
        Query::OrderDesc(attribute) => json!({
            "method": "orderDesc",
            "attribute": attribute,
        }),
        Query::Limit(limit) => json!({
            "method": "limit",
            "values": [limit],
        }),
        Query::Offset(offset) => json!({
            "method": "offset",
            "values": [offset],
        }),
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, StoreError> {
    serde_json::from_value(body)
        .map_err(|err| domain::StorageError::InvalidDocument(Box::new(err)).into())
}

#[derive(serde::Deserialize)]
struct DocumentEnvelope {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "$createdAt")]
    created: DateTime<Utc>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

#[derive(serde::Deserialize)]
struct ListEnvelope {
    documents: Vec<DocumentEnvelope>,
}

impl From<DocumentEnvelope> for Document {
    fn from(value: DocumentEnvelope) -> Self {
        Self {
            id: value.id,
            created: value.created,
            fields: value.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use crate::config::{Collections, DEFAULT_TIMEOUT};

    use super::*;

    #[derive(Clone, Default)]
    struct FakeTransport {
        state: Arc<FakeState>,
    }

    #[derive(Default)]
    struct FakeState {
        requests: Mutex<Vec<StoreRequest>>,
        responses: Mutex<VecDeque<Result<StoreResponse, domain::StorageError>>>,
    }

    impl SendRequest for FakeTransport {
        async fn send_request(
            &self,
            request: StoreRequest,
        ) -> Result<StoreResponse, domain::StorageError> {
            self.state.requests.lock().unwrap().push(request);
            self.state
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(domain::StorageError::NoConnection))
        }
    }

    fn remote(
        responses: Vec<Result<StoreResponse, domain::StorageError>>,
    ) -> RemoteStore<FakeTransport> {
        let sender = FakeTransport::default();
        sender.state.responses.lock().unwrap().extend(responses);
        RemoteStore {
            sender,
            config: StoreConfig {
                endpoint: "https://store.example".to_string(),
                project_id: "liftlog".to_string(),
                database_id: "main".to_string(),
                collections: Collections::default(),
                timeout: DEFAULT_TIMEOUT,
            },
        }
    }

    fn response(status: u16, body: Value) -> Result<StoreResponse, domain::StorageError> {
        Ok(StoreResponse { status, body })
    }

    #[tokio::test]
    async fn test_list_documents() {
        let store = remote(vec![response(
            200,
            json!({
                "total": 1,
                "documents": [{
                    "$id": "1",
                    "$createdAt": "2024-01-02T10:00:00.000+00:00",
                    "name": "A",
                }],
            }),
        )]);

        let documents = store
            .list_documents(
                "workouts",
                &[Query::Equal("name", json!("A")), Query::Limit(2)],
            )
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "1");
        assert_eq!(documents[0].fields.get("name"), Some(&json!("A")));

        let requests = store.sender.state.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(
            requests[0].headers,
            [("X-Appwrite-Project".to_string(), "liftlog".to_string())]
        );

        let url = reqwest::Url::parse(&requests[0].url).unwrap();
        assert_eq!(
            url.path(),
            "/v1/databases/main/collections/workouts/documents"
        );
        assert_eq!(
            url.query_pairs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect::<Vec<_>>(),
            [
                (
                    "queries[]".to_string(),
                    json!({"method": "equal", "attribute": "name", "values": ["A"]}).to_string()
                ),
                (
                    "queries[]".to_string(),
                    json!({"method": "limit", "values": [2]}).to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_documents_rejected() {
        let store = remote(vec![response(403, json!({"message": "unauthorized"}))]);

        assert!(matches!(
            store.list_documents("workouts", &[]).await,
            Err(StoreError::Storage(domain::StorageError::Rejected(403)))
        ));
    }

    #[tokio::test]
    async fn test_get_document() {
        let store = remote(vec![response(
            200,
            json!({
                "$id": "1",
                "$createdAt": "2024-01-02T10:00:00.000+00:00",
                "$collectionId": "workouts",
                "name": "A",
            }),
        )]);

        let document = store.get_document("workouts", "1").await.unwrap();

        assert_eq!(document.id, "1");
        assert_eq!(
            document.created,
            Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
        );
        assert_eq!(document.fields.get("name"), Some(&json!("A")));

        let requests = store.sender.state.requests.lock().unwrap();
        assert_eq!(
            requests[0].url,
            "https://store.example/v1/databases/main/collections/workouts/documents/1"
        );
    }

    #[tokio::test]
    async fn test_get_document_not_found() {
        let store = remote(vec![response(404, json!({"message": "not found"}))]);

        assert!(matches!(
            store.get_document("workouts", "1").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_get_document_invalid_body() {
        let store = remote(vec![response(200, json!({"name": "A"}))]);

        assert!(matches!(
            store.get_document("workouts", "1").await,
            Err(StoreError::Storage(domain::StorageError::InvalidDocument(_)))
        ));
    }

    #[tokio::test]
    async fn test_create_document() {
        let store = remote(vec![response(
            201,
            json!({
                "$id": "1",
                "$createdAt": "2024-01-02T10:00:00.000+00:00",
                "name": "A",
            }),
        )]);

        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("A"));
        let document = store
            .create_document("workouts", "1", fields)
            .await
            .unwrap();

        assert_eq!(document.id, "1");

        let requests = store.sender.state.requests.lock().unwrap();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(
            requests[0].url,
            "https://store.example/v1/databases/main/collections/workouts/documents"
        );
        assert_eq!(
            requests[0].body,
            Some(json!({"documentId": "1", "data": {"name": "A"}}))
        );
    }

    #[tokio::test]
    async fn test_create_document_conflict() {
        let store = remote(vec![response(409, json!({"message": "already exists"}))]);

        assert!(matches!(
            store.create_document("workouts", "1", Map::new()).await,
            Err(StoreError::Storage(domain::StorageError::Rejected(409)))
        ));
    }

    #[tokio::test]
    async fn test_update_document() {
        let store = remote(vec![response(
            200,
            json!({
                "$id": "1",
                "$createdAt": "2024-01-02T10:00:00.000+00:00",
                "sets": [],
            }),
        )]);

        let mut fields = Map::new();
        fields.insert("sets".to_string(), json!([]));
        store
            .update_document("workout_exercises", "1", fields)
            .await
            .unwrap();

        let requests = store.sender.state.requests.lock().unwrap();
        assert_eq!(requests[0].method, Method::PATCH);
        assert_eq!(
            requests[0].url,
            "https://store.example/v1/databases/main/collections/workout_exercises/documents/1"
        );
        assert_eq!(requests[0].body, Some(json!({"data": {"sets": []}})));
    }

    #[tokio::test]
    async fn test_update_document_not_found() {
        let store = remote(vec![response(404, json!({"message": "not found"}))]);

        assert!(matches!(
            store.update_document("workouts", "1", Map::new()).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_document() {
        let store = remote(vec![response(204, Value::Null)]);

        store.delete_document("workouts", "1").await.unwrap();

        let requests = store.sender.state.requests.lock().unwrap();
        assert_eq!(requests[0].method, Method::DELETE);
        assert_eq!(
            requests[0].url,
            "https://store.example/v1/databases/main/collections/workouts/documents/1"
        );
        assert_eq!(requests[0].body, None);
    }

    #[tokio::test]
    async fn test_delete_document_not_found() {
        let store = remote(vec![response(404, json!({"message": "not found"}))]);

        assert!(matches!(
            store.delete_document("workouts", "1").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_document_rejected() {
        let store = remote(vec![response(500, Value::Null)]);

        assert!(matches!(
            store.delete_document("workouts", "1").await,
            Err(StoreError::Storage(domain::StorageError::Rejected(500)))
        ));
    }

    #[tokio::test]
    async fn test_no_connection() {
        let store = remote(vec![]);

        assert!(matches!(
            store.get_document("workouts", "1").await,
            Err(StoreError::Storage(domain::StorageError::NoConnection))
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let store = remote(vec![Err(domain::StorageError::Timeout)]);

        assert!(matches!(
            store.list_documents("workouts", &[]).await,
            Err(StoreError::Storage(domain::StorageError::Timeout))
        ));
    }

    #[test]
    fn test_http_transport() {
        let config = StoreConfig {
            endpoint: "https://store.example".to_string(),
            project_id: "liftlog".to_string(),
            database_id: "main".to_string(),
            collections: Collections::default(),
            timeout: DEFAULT_TIMEOUT,
        };

        assert!(RemoteStore::new(config).is_ok());
    }
}

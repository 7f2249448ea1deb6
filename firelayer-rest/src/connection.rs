//! HTTP connection to the Firestore REST service or its emulator.

use std::fmt;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument};
use url::Url;

use firelayer_core::{
    config::FirebaseConfig,
    document::{NativeDocumentSnapshot, Record},
    error::{DatabaseError, DatabaseResult},
    query::{QueryOptions, QueryTranslator},
};

use crate::{
    document::{BatchGetRequest, BatchGetResponse, FirestoreDocumentSnapshot, FirestoreQuerySnapshot},
    path::DatabasePath,
    query::{RunQueryResponse, StructuredQueryBuilder},
    write::{CommitRequest, CommitResponse, Write},
};

/// Production endpoint of the Firestore REST API.
pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1/";

const USER_AGENT: &str = concat!("firelayer/", env!("CARGO_PKG_VERSION"));

/// How requests identify themselves to the service.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No credentials. Only useful against an emulator.
    Anonymous,
    /// A Firebase web API key, optionally with the ID token of a signed-in user.
    /// Requests are subject to security rules.
    ApiKey { key: String, id_token: Option<String> },
    /// An OAuth2 bearer token. Requests bypass security rules.
    Bearer(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::ApiKey { id_token, .. } => f
                .debug_struct("ApiKey")
                .field("key", &"<redacted>")
                .field("id_token", &id_token.as_ref().map(|_| "<redacted>"))
                .finish(),
            Credentials::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestConnection {
    http: reqwest::Client,
    base: Url,
    database: DatabasePath,
    credentials: Credentials,
}

impl RestConnection {
    /// Creates a connection for the project in `config`.
    ///
    /// Nothing is sent over the network here.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Initialization`] if no project id is configured,
    /// the emulator host is not a valid `host:port`, or the HTTP client cannot be
    /// constructed.
    #[instrument(level = "debug", skip(config), fields(
        project_id = ?config.project_id,
        emulator_host = ?config.emulator_host
    ))]
    pub fn connect(config: &FirebaseConfig, credentials: Credentials) -> DatabaseResult<Self> {
        let project_id = config
            .project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| DatabaseError::Initialization("No project id configured".into()))?;

        let base = base_url(config.emulator_host.as_deref())?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| DatabaseError::Initialization(e.to_string()))?;

        info!(endpoint = %base, "Firestore connection configured");

        Ok(Self {
            http,
            base,
            database: DatabasePath::new(project_id, config.database()),
            credentials,
        })
    }

    pub fn database_path(&self) -> &DatabasePath {
        &self.database
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether requests go to an emulator instead of the production service.
    pub fn is_emulator(&self) -> bool {
        self.base.scheme() == "http"
    }

    /// Reads one document through `documents:batchGet`.
    ///
    /// An absent document comes back as a snapshot whose `exists()` is `false`.
    /// Every failed response, including a 404 for a missing database, is an error.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_document(&self, collection: &str, id: &str) -> DatabaseResult<FirestoreDocumentSnapshot> {
        let name = self.database.document(collection, id);
        let url = self
            .database
            .documents_method_url(&self.base, "batchGet")?;
        let request = BatchGetRequest {
            documents: vec![name.clone()],
        };

        let responses: Vec<BatchGetResponse> = self.post(url, &request).await?;
        let snapshot = responses
            .into_iter()
            .find_map(BatchGetResponse::into_snapshot)
            .unwrap_or_else(|| FirestoreDocumentSnapshot::missing(name, None));

        if !snapshot.exists() {
            debug!("document not found");
        }
        Ok(snapshot)
    }

    #[instrument(level = "debug", skip(self, data), fields(fields = data.len()))]
    pub async fn set_document(&self, collection: &str, id: &str, data: &Record) -> DatabaseResult<()> {
        self.commit(Write::set(self.database.document(collection, id), data))
            .await
            .map(|_| ())
    }

    #[instrument(level = "debug", skip(self, data), fields(fields = data.len()))]
    pub async fn update_document(&self, collection: &str, id: &str, data: &Record) -> DatabaseResult<()> {
        self.commit(Write::update(self.database.document(collection, id), data))
            .await
            .map(|_| ())
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn delete_document(&self, collection: &str, id: &str) -> DatabaseResult<()> {
        self.commit(Write::delete(self.database.document(collection, id)))
            .await
            .map(|_| ())
    }

    /// Applies a single write atomically.
    pub async fn commit(&self, write: Write) -> DatabaseResult<CommitResponse> {
        let url = self
            .database
            .documents_method_url(&self.base, "commit")?;

        self.post(url, &CommitRequest::from(write)).await
    }

    /// Runs a query over `collection`, or scans it when `options` is `None`.
    #[instrument(level = "debug", skip(self, options))]
    pub async fn run_query(
        &self,
        collection: &str,
        options: Option<&QueryOptions>,
    ) -> DatabaseResult<FirestoreQuerySnapshot> {
        let (parent, collection_id) = self.database.collection_parent(collection);
        let default_options = QueryOptions::default();
        let request = StructuredQueryBuilder::new(parent, collection_id)
            .translate(options.unwrap_or(&default_options))?;

        let url = self
            .database
            .run_query_url(&self.base, collection)?;
        let responses: Vec<RunQueryResponse> = self.post(url, &request).await?;

        let read_time = responses
            .iter()
            .find_map(|response| response.read_time.clone());
        let docs: Vec<FirestoreDocumentSnapshot> = responses
            .into_iter()
            .filter_map(|response| {
                response
                    .document
                    .map(|doc| FirestoreDocumentSnapshot::found(doc, response.read_time))
            })
            .collect();

        debug!(count = docs.len(), "query finished");
        Ok(FirestoreQuerySnapshot::new(docs, read_time))
    }

    async fn post<B, T>(&self, url: Url, body: &B) -> DatabaseResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        read_json(response).await
    }

    fn request(&self, method: Method, mut url: Url) -> RequestBuilder {
        let token = match &self.credentials {
            Credentials::Anonymous => None,
            Credentials::ApiKey { key, id_token } => {
                url.query_pairs_mut().append_pair("key", key);
                id_token.as_deref()
            }
            Credentials::Bearer(token) => Some(token.as_str()),
        };

        let request = self.http.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn base_url(emulator_host: Option<&str>) -> DatabaseResult<Url> {
    let raw = match emulator_host {
        Some(host) => format!("http://{}/v1/", host.trim().trim_end_matches('/')),
        None => FIRESTORE_ENDPOINT.to_string(),
    };

    Url::parse(&raw).map_err(|e| DatabaseError::Initialization(format!("Invalid endpoint {raw}: {e}")))
}

fn transport(error: reqwest::Error) -> DatabaseError {
    DatabaseError::Transport(error.to_string())
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> DatabaseResult<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if !status.is_success() {
        return Err(decode_error(status, &body));
    }

    Ok(serde_json::from_str(&body)?)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Single(ErrorBody),
    Stream(Vec<ErrorBody>),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Status,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Status {
    message: String,
    status: Option<String>,
}

/// Turns a failed response into the service's error code and message.
fn decode_error(status: StatusCode, body: &str) -> DatabaseError {
    let decoded = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope::Single(body)) => Some(body.error),
        Ok(ErrorEnvelope::Stream(bodies)) => bodies.into_iter().next().map(|body| body.error),
        Err(_) => None,
    };

    let (code, message) = match decoded {
        Some(error) => (
            error.status.unwrap_or_else(|| "UNKNOWN".into()),
            error.message,
        ),
        None => ("UNKNOWN".into(), body.trim().to_string()),
    };

    DatabaseError::Backend {
        status: status.as_u16(),
        code,
        message,
    }
}

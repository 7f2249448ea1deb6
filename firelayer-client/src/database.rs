//! The client adapter and its builder.

use tracing::{debug, instrument};

use firelayer_core::{
    config::FirebaseConfig,
    database::DatabaseBuilder,
    error::{DatabaseError, DatabaseResult},
};
use firelayer_rest::{Credentials, RestConnection, RestDatabase, delegate_document_database};

/// Firestore adapter with end-user privileges.
///
/// Construction never fails and never blocks: the connection is set up on first
/// use and shared by every clone. If setup fails, every operation on this
/// instance returns that same [`DatabaseError::Initialization`].
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    database: RestDatabase,
}

impl FirestoreClient {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            database: RestDatabase::new(async move { initialize(config) }),
        }
    }

    pub fn builder() -> FirestoreClientBuilder {
        FirestoreClientBuilder::default()
    }

    /// Waits for the connection to be set up, surfacing initialization errors early.
    pub async fn ready(&self) -> DatabaseResult<()> {
        self.database.ready().await
    }
}

#[instrument(level = "debug", skip(config), fields(project_id = ?config.project_id))]
fn initialize(config: FirebaseConfig) -> DatabaseResult<RestConnection> {
    let credentials = match (&config.api_key, &config.id_token, &config.emulator_host) {
        (Some(key), id_token, _) => Credentials::ApiKey {
            key: key.clone(),
            id_token: id_token.clone(),
        },
        (None, Some(id_token), Some(_)) => Credentials::Bearer(id_token.clone()),
        (None, None, Some(_)) => Credentials::Anonymous,
        (None, _, None) => {
            return Err(DatabaseError::Initialization(
                "No API key configured for the Firestore client".into(),
            ));
        }
    };

    debug!(credentials = ?credentials, "initializing Firestore client");
    RestConnection::connect(&config, credentials)
}

delegate_document_database!(FirestoreClient => database);

/// Builder for [`FirestoreClient`].
#[derive(Debug, Clone, Default)]
pub struct FirestoreClientBuilder {
    config: FirebaseConfig,
}

impl FirestoreClientBuilder {
    /// Starts from an existing configuration instead of an empty one.
    pub fn config(mut self, config: FirebaseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.config = self.config.with_project_id(project_id);
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config = self.config.with_api_key(api_key);
        self
    }

    /// Signs requests with a Firebase Authentication ID token.
    pub fn id_token(mut self, id_token: impl Into<String>) -> Self {
        self.config = self.config.with_id_token(id_token);
        self
    }

    pub fn emulator_host(mut self, host: impl Into<String>) -> Self {
        self.config = self.config.with_emulator_host(host);
        self
    }
}

impl DatabaseBuilder for FirestoreClientBuilder {
    type Database = FirestoreClient;

    fn build(self) -> FirestoreClient {
        FirestoreClient::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firelayer_core::{database::DocumentDatabase, query::QueryOptions};
    use futures::executor::block_on;

    fn credentials_for(config: FirebaseConfig) -> DatabaseResult<Credentials> {
        initialize(config).map(|conn: RestConnection| conn.credentials().clone())
    }

    #[test]
    fn api_key_and_id_token_authorize_requests() {
        let credentials = credentials_for(
            FirebaseConfig::new()
                .with_project_id("my-project")
                .with_api_key("web-key")
                .with_id_token("id-token"),
        )
        .unwrap();

        assert_eq!(
            credentials,
            Credentials::ApiKey {
                key: "web-key".into(),
                id_token: Some("id-token".into()),
            }
        );
    }

    #[test]
    fn emulator_accepts_unauthenticated_clients() {
        let credentials = credentials_for(
            FirebaseConfig::new()
                .with_project_id("demo-test-project")
                .with_emulator_host("localhost:8080"),
        )
        .unwrap();

        assert_eq!(credentials, Credentials::Anonymous);
    }

    #[test]
    fn production_without_api_key_fails_to_initialize() {
        let client = FirestoreClient::builder()
            .project_id("my-project")
            .build();

        assert!(matches!(block_on(client.ready()), Err(DatabaseError::Initialization(_))));
    }

    #[test]
    fn failed_initialization_fails_every_operation_the_same_way() {
        let client = FirestoreClient::new(FirebaseConfig::new().with_api_key("web-key"));

        let first = block_on(client.get_document("users", "user1")).unwrap_err();
        let second = block_on(client.delete_document("users", "user1")).unwrap_err();
        let from_clone = block_on(client.clone().query("users", QueryOptions::new())).unwrap_err();

        assert!(matches!(first, DatabaseError::Initialization(_)));
        assert_eq!(first, second);
        assert_eq!(first, from_clone);
    }
}

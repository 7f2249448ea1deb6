//! The admin adapter and its builder.

use tracing::{debug, instrument};

use firelayer_core::{
    config::{ACCESS_TOKEN_ENV, FirebaseConfig},
    database::DatabaseBuilder,
    error::{DatabaseError, DatabaseResult},
};
use firelayer_rest::{Credentials, RestConnection, RestDatabase, delegate_document_database};

/// Bearer token the Firestore emulator accepts as full admin access.
pub const EMULATOR_OWNER_TOKEN: &str = "owner";

/// Firestore adapter with administrative privileges.
///
/// Like the client adapter, it sets up its connection on first use, once, and
/// keeps a failed setup for the lifetime of the instance.
#[derive(Debug, Clone)]
pub struct FirestoreAdmin {
    database: RestDatabase,
}

impl FirestoreAdmin {
    /// Creates an adapter configured entirely from the process environment.
    pub fn new() -> Self {
        Self::with_config(FirebaseConfig::new())
    }

    /// Creates an adapter from `config`, filling unset fields from the process environment.
    pub fn with_config(config: FirebaseConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> FirestoreAdminBuilder {
        FirestoreAdminBuilder::default()
    }

    /// Waits for the connection to be set up, surfacing initialization errors early.
    pub async fn ready(&self) -> DatabaseResult<()> {
        self.database.ready().await
    }
}

impl Default for FirestoreAdmin {
    fn default() -> Self {
        Self::new()
    }
}

#[instrument(level = "debug", skip_all)]
fn initialize(config: FirebaseConfig, ambient: Option<FirebaseConfig>) -> DatabaseResult<RestConnection> {
    let config = config.or(ambient.unwrap_or_else(FirebaseConfig::from_env));

    let credentials = match (&config.emulator_host, &config.access_token) {
        (Some(_), _) => Credentials::Bearer(EMULATOR_OWNER_TOKEN.into()),
        (None, Some(token)) => Credentials::Bearer(token.clone()),
        (None, None) => {
            return Err(DatabaseError::Initialization(format!(
                "No access token configured for the Firestore admin adapter; set {ACCESS_TOKEN_ENV}"
            )));
        }
    };

    debug!(project_id = ?config.project_id, emulator = config.emulator_host.is_some(), "initializing Firestore admin");
    RestConnection::connect(&config, credentials)
}

delegate_document_database!(FirestoreAdmin => database);

/// Builder for [`FirestoreAdmin`].
#[derive(Debug, Clone, Default)]
pub struct FirestoreAdminBuilder {
    config: FirebaseConfig,
    ambient: Option<FirebaseConfig>,
}

impl FirestoreAdminBuilder {
    pub fn config(mut self, config: FirebaseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.config = self.config.with_project_id(project_id);
        self
    }

    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.config = self.config.with_access_token(access_token);
        self
    }

    pub fn emulator_host(mut self, host: impl Into<String>) -> Self {
        self.config = self.config.with_emulator_host(host);
        self
    }

    /// Uses `ambient` in place of the process environment as the fallback settings.
    pub fn ambient(mut self, ambient: FirebaseConfig) -> Self {
        self.ambient = Some(ambient);
        self
    }
}

impl DatabaseBuilder for FirestoreAdminBuilder {
    type Database = FirestoreAdmin;

    fn build(self) -> FirestoreAdmin {
        let Self { config, ambient } = self;

        FirestoreAdmin {
            database: RestDatabase::new(async move { initialize(config, ambient) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firelayer_core::{database::DocumentDatabase, document::Record};
    use futures::executor::block_on;

    fn credentials_for(config: FirebaseConfig, ambient: FirebaseConfig) -> DatabaseResult<Credentials> {
        initialize(config, Some(ambient)).map(|conn| conn.credentials().clone())
    }

    #[test]
    fn emulator_uses_the_owner_token() {
        let credentials = credentials_for(
            FirebaseConfig::new(),
            FirebaseConfig::new()
                .with_project_id("demo-test-project")
                .with_emulator_host("localhost:8080")
                .with_access_token("ignored"),
        )
        .unwrap();

        assert_eq!(credentials, Credentials::Bearer(EMULATOR_OWNER_TOKEN.into()));
    }

    #[test]
    fn explicit_settings_take_precedence_over_ambient_ones() {
        let conn = initialize(
            FirebaseConfig::new()
                .with_project_id("explicit")
                .with_access_token("explicit-token"),
            Some(
                FirebaseConfig::new()
                    .with_project_id("ambient")
                    .with_access_token("ambient-token"),
            ),
        )
        .unwrap();

        assert_eq!(conn.database_path().name(), "projects/explicit/databases/(default)");
        assert_eq!(conn.credentials(), &Credentials::Bearer("explicit-token".into()));
        assert!(!conn.is_emulator());
    }

    #[test]
    fn production_without_access_token_fails_to_initialize() {
        let err = credentials_for(
            FirebaseConfig::new().with_project_id("my-project"),
            FirebaseConfig::new(),
        )
        .unwrap_err();

        assert!(matches!(err, DatabaseError::Initialization(message) if message.contains(ACCESS_TOKEN_ENV)));
    }

    #[test]
    fn failed_initialization_is_permanent() {
        let admin = FirestoreAdmin::builder()
            .emulator_host("localhost:8080")
            .ambient(FirebaseConfig::new())
            .build();

        let first = block_on(admin.ready()).unwrap_err();
        let later = block_on(admin.set_document("users", "user1", Record::new())).unwrap_err();

        assert!(matches!(first, DatabaseError::Initialization(_)));
        assert_eq!(first, later);
    }
}

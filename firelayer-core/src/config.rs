//! Connection settings shared by the client and admin adapters.
//!
//! Every field is optional. The client adapter reads only what is set here; the
//! admin adapter fills missing fields from the ambient process environment
//! (see [`FirebaseConfig::from_env`]).

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Host of a local Firestore emulator, e.g. `localhost:8080`.
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";
/// Google Cloud project id.
pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
/// Legacy name of [`PROJECT_ENV`], still set by the gcloud tooling.
pub const LEGACY_PROJECT_ENV: &str = "GCLOUD_PROJECT";
/// OAuth2 access token with Datastore scope.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// The database id used when none is configured.
pub const DEFAULT_DATABASE: &str = "(default)";

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FirebaseConfig {
    /// Google Cloud / Firebase project id.
    pub project_id: Option<String>,
    /// Firestore database id, `(default)` when unset.
    pub database_id: Option<String>,
    /// `host:port` of a Firestore emulator. Requests go over plain HTTP when set.
    pub emulator_host: Option<String>,
    /// Web API key of the Firebase app (client adapter).
    pub api_key: Option<String>,
    /// Firebase Authentication ID token of the signed-in user (client adapter).
    pub id_token: Option<String>,
    /// OAuth2 access token (admin adapter).
    pub access_token: Option<String>,
    /// Per-request timeout. No timeout when unset.
    #[serde(with = "timeout_secs", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");

        f.debug_struct("FirebaseConfig")
            .field("project_id", &self.project_id)
            .field("database_id", &self.database_id)
            .field("emulator_host", &self.emulator_host)
            .field("api_key", &redacted(&self.api_key))
            .field("id_token", &redacted(&self.id_token))
            .field("access_token", &redacted(&self.access_token))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FirebaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the ambient settings from the process environment.
    ///
    /// Empty variables are treated as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the ambient settings through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            project_id: get(PROJECT_ENV).or_else(|| get(LEGACY_PROJECT_ENV)),
            emulator_host: get(EMULATOR_HOST_ENV),
            access_token: get(ACCESS_TOKEN_ENV),
            ..Self::default()
        }
    }

    /// Returns a copy where every unset field is taken from `fallback`.
    pub fn or(self, fallback: FirebaseConfig) -> Self {
        Self {
            project_id: self.project_id.or(fallback.project_id),
            database_id: self.database_id.or(fallback.database_id),
            emulator_host: self.emulator_host.or(fallback.emulator_host),
            api_key: self.api_key.or(fallback.api_key),
            id_token: self.id_token.or(fallback.id_token),
            access_token: self.access_token.or(fallback.access_token),
            timeout: self.timeout.or(fallback.timeout),
        }
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = Some(database_id.into());
        self
    }

    pub fn with_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured database id, or [`DEFAULT_DATABASE`].
    pub fn database(&self) -> &str {
        self.database_id.as_deref().unwrap_or(DEFAULT_DATABASE)
    }
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(timeout) => serializer.serialize_some(&timeout.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            None => Ok(None),
            Some(secs) if secs == 0.0 => Ok(None),
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(|e| de::Error::custom(format!("invalid timeout {secs}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn reads_ambient_settings_through_lookup() {
        let env = HashMap::from([
            (LEGACY_PROJECT_ENV, "legacy-project"),
            (EMULATOR_HOST_ENV, "localhost:8080"),
            (ACCESS_TOKEN_ENV, "  "),
        ]);

        let config = FirebaseConfig::from_lookup(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.project_id.as_deref(), Some("legacy-project"));
        assert_eq!(config.emulator_host.as_deref(), Some("localhost:8080"));
        assert_eq!(config.access_token, None);
        assert_eq!(config.database(), DEFAULT_DATABASE);
    }

    #[test]
    fn explicit_settings_win_over_fallback() {
        let config = FirebaseConfig::new()
            .with_project_id("explicit")
            .or(FirebaseConfig::new()
                .with_project_id("ambient")
                .with_emulator_host("localhost:8080"));

        assert_eq!(config.project_id.as_deref(), Some("explicit"));
        assert_eq!(config.emulator_host.as_deref(), Some("localhost:8080"));
    }

    #[test]
    fn deserializes_camel_case_settings() {
        let config: FirebaseConfig = serde_json::from_value(json!({
            "projectId": "demo-test-project",
            "databaseId": "orders",
            "apiKey": "web-key",
            "timeout": 2.5
        }))
        .unwrap();

        assert_eq!(
            config,
            FirebaseConfig::new()
                .with_project_id("demo-test-project")
                .with_database_id("orders")
                .with_api_key("web-key")
                .with_timeout(Duration::from_millis(2500))
        );
    }

    #[test]
    fn oversized_timeouts_are_rejected() {
        assert!(serde_json::from_value::<FirebaseConfig>(json!({ "timeout": 1e300 })).is_err());
        assert!(serde_json::from_value::<FirebaseConfig>(json!({ "timeout": -1.0 })).is_err());
        assert_eq!(
            serde_json::from_value::<FirebaseConfig>(json!({ "timeout": 0 })).unwrap().timeout,
            None
        );
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let config = FirebaseConfig::new()
            .with_project_id("demo-test-project")
            .with_api_key("AIza-secret")
            .with_id_token("eyJ-secret")
            .with_access_token("ya29.secret");
        let debug = format!("{config:?}");

        assert!(!debug.contains("secret"), "{debug}");
        assert!(debug.contains("demo-test-project"));
        assert!(debug.contains("<redacted>"));
    }
}

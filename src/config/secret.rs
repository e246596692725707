//! Credentials held in configuration and manifests
//!
//! Registry passwords, artifact-host passwords and the status database
//! connection string are wrapped in [`SecretString`] as soon as they are
//! read. `Debug` output is redacted and the buffer is zeroed on drop; the
//! plain text is only reachable through `expose_secret()` at the point of
//! use (a `docker login`, an HTTP basic-auth header, a Postgres connect).
//!
//! ```rust
//! use appexport::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let password = secret_string("hub-password".to_string());
//! assert!(!format!("{password:?}").contains("hub-password"));
//! assert_eq!(password.expose_secret().as_str(), "hub-password");
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Plain-text credential stored inside a [`SecretString`]
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl SecretValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Redacted, zero-on-drop credential string
pub type SecretString = Secret<SecretValue>;

/// Wraps a credential read from a manifest, a config file or the environment
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_registry_password_redacted_in_debug() {
        let creds = secret_string("hub-s3cret".to_string());
        let debug_output = format!("{creds:?}");

        assert!(!debug_output.contains("hub-s3cret"));
        assert!(debug_output.contains("REDACTED"));
        assert_eq!(creds.expose_secret().as_str(), "hub-s3cret");
    }

    #[test]
    fn test_connection_string_from_toml() {
        #[derive(Serialize, Deserialize)]
        struct StatusSection {
            connection_string: SecretString,
        }

        let section: StatusSection =
            toml::from_str(r#"connection_string = "postgres://u:pw@db/exports""#).unwrap();
        assert_eq!(
            section.connection_string.expose_secret().as_str(),
            "postgres://u:pw@db/exports"
        );

        let json = serde_json::to_string(&section).unwrap();
        assert!(json.contains("postgres://u:pw@db/exports"));
    }
}

//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers the gateway passes around, so a
//! secret key can never be confused with a request id or a bare string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Secret category holding authentication parameters
pub const AUTH_CATEGORY: &str = "auth";

/// Secret category holding webhook signing secrets
pub const WEBHOOK_CATEGORY: &str = "webhook";

/// Key of a stored secret
///
/// Secrets are addressed as `{system_id}:{category}:{name}`. The system id and
/// category may not contain `:`; the name may (it is everything after the
/// second separator).
///
/// # Examples
///
/// ```
/// use switchyard::domain::ids::SecretKey;
/// use std::str::FromStr;
///
/// let key = SecretKey::from_str("sf1:auth:client_secret").unwrap();
/// assert_eq!(key.system_id(), "sf1");
/// assert_eq!(key.category(), "auth");
/// assert_eq!(key.name(), "client_secret");
/// assert_eq!(key.to_string(), "sf1:auth:client_secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretKey {
    system_id: String,
    category: String,
    name: String,
}

impl SecretKey {
    /// Creates a new SecretKey
    ///
    /// # Returns
    ///
    /// Returns `Err` if any component is empty or the system id / category
    /// contains the `:` separator
    pub fn new(
        system_id: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, String> {
        let system_id = system_id.into();
        let category = category.into();
        let name = name.into();

        if system_id.trim().is_empty() {
            return Err("Secret key system id cannot be empty".to_string());
        }
        if category.trim().is_empty() {
            return Err("Secret key category cannot be empty".to_string());
        }
        if name.trim().is_empty() {
            return Err("Secret key name cannot be empty".to_string());
        }
        if system_id.contains(':') || category.contains(':') {
            return Err(format!(
                "Secret key system id and category may not contain ':': {system_id}:{category}"
            ));
        }

        Ok(Self {
            system_id,
            category,
            name,
        })
    }

    /// Prefix shared by every secret of a system and category
    pub fn prefix(system_id: &str, category: &str) -> String {
        format!("{system_id}:{category}:")
    }

    /// Returns the system id component
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    /// Returns the category component
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns the name component
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.system_id, self.category, self.name)
    }
}

impl FromStr for SecretKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(system_id), Some(category), Some(name)) => Self::new(system_id, category, name),
            _ => Err(format!(
                "Invalid secret key format. Expected {{system_id}}:{{category}}:{{name}}, got: {s}"
            )),
        }
    }
}

impl TryFrom<String> for SecretKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SecretKey> for String {
    fn from(key: SecretKey) -> Self {
        key.to_string()
    }
}

/// Request identifier attached to every gateway call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generates a fresh random request id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the request id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

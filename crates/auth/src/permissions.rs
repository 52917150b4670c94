use std::borrow::{Borrow, Cow};
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Permission key identifier.
///
/// Keys are opaque strings issued by the backend's permission list
/// (e.g. `"employee_view"`, `"user_roles_create"`). There is no wildcard:
/// a key grants exactly the capability it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionKey(Cow<'static, str>);

impl PermissionKey {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Module part of the key (`"user_roles"` for `"user_roles_create"`).
    ///
    /// Keys without an `_action` suffix are their own module.
    pub fn module(&self) -> &str {
        match self.0.rsplit_once('_') {
            Some((module, _action)) if !module.is_empty() => module,
            _ => &self.0,
        }
    }
}

impl core::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PermissionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for PermissionKey {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionPayloadError {
    #[error("permission payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("permission payload contains an empty key")]
    EmptyKey,

    #[error("permission payload contains key '{0}' more than once")]
    DuplicateKey(String),
}

/// Whether a backend permission value counts as granted.
///
/// Only `true`, `1` and `"1"` grant; everything else denies, including the
/// float `1.0` and the string `"true"`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64() == Some(1) || n.as_i64() == Some(1),
        Value::String(s) => s == "1",
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Session-scoped mapping of permission key to granted/denied.
///
/// Lookups are fail-closed: a key that is absent is denied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<PermissionKey, bool>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize the backend's flat `{key: 0|1|bool}` payload.
    ///
    /// Keys are trimmed; two raw keys that trim to the same key are rejected.
    pub fn from_payload(payload: &Value) -> Result<Self, PermissionPayloadError> {
        let Value::Object(entries) = payload else {
            return Err(PermissionPayloadError::NotAnObject(json_kind(payload)));
        };

        let mut map = BTreeMap::new();
        for (raw_key, value) in entries {
            let key = raw_key.trim();
            if key.is_empty() {
                return Err(PermissionPayloadError::EmptyKey);
            }
            if map
                .insert(PermissionKey::new(key.to_string()), is_truthy(value))
                .is_some()
            {
                return Err(PermissionPayloadError::DuplicateKey(key.to_string()));
            }
        }
        Ok(Self(map))
    }

    /// Build a map in which every given key is granted.
    pub fn granting<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PermissionKey>,
    {
        keys.into_iter().map(|k| (k.into(), true)).collect()
    }

    pub fn is_granted(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(false)
    }

    /// Keys explicitly granted, in key order.
    pub fn granted_keys(&self) -> impl Iterator<Item = &PermissionKey> {
        self.0.iter().filter(|(_, granted)| **granted).map(|(k, _)| k)
    }

    pub fn granted_count(&self) -> usize {
        self.0.values().filter(|granted| **granted).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<PermissionKey>> FromIterator<(K, bool)> for PermissionMap {
    fn from_iter<T: IntoIterator<Item = (K, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

//! Helpers for PATCH payloads.

use serde::{Deserialize, Deserializer};

/// Reads a clearable field: absent stays `None`, `null` becomes `Some(None)`.
///
/// Pair with `#[serde(default)]` on an `Option<Option<T>>` field.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Serde utility functions for common patterns
use serde::{Deserialize, Deserializer};

/// Deserialize an explicit `null` the same way as a missing field.
///
/// Hand-edited YAML frequently leaves a section header with no body
/// (`instances:`), which parses as `null` rather than an empty map.
///
/// Usage:
/// ```ignore
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Example {
///     #[serde(default, deserialize_with = "crate::serde_utils::null_as_default")]
///     xq: IndexMap<String, i64>,
/// }
/// ```
pub fn null_as_default<'de, T, D>(de: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Deserialize a string field that the server may send as `null`.
pub fn null_as_empty_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    null_as_default(de)
}

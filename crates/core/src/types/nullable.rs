//! Serde helper for fields the API may send as `null`.

use serde::{Deserialize, Deserializer};

/// Decode `null` as the type's default.
///
/// `#[serde(default)]` only covers a missing key; pair it with this for
/// nullable columns such as `"tags": null`.
///
/// # Errors
///
/// Returns the deserializer's error when the value is neither `null` nor a `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Tagged {
        #[serde(default, deserialize_with = "null_as_default")]
        tags: Vec<String>,
    }

    #[test]
    fn test_null_missing_and_present() {
        let null: Tagged = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert!(null.tags.is_empty());

        let missing: Tagged = serde_json::from_str("{}").unwrap();
        assert!(missing.tags.is_empty());

        let present: Tagged = serde_json::from_str(r#"{"tags": ["a"]}"#).unwrap();
        assert_eq!(present.tags, vec!["a".to_string()]);
    }
}

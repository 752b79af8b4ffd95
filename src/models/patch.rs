//! Partial-update helpers for PATCH bodies.
//!
//! A nullable column needs three states: absent (keep), `null` (clear) and a
//! value (set). Fields typed `Option<Option<T>>` and tagged
//! `#[serde(default, deserialize_with = "nullable")]` get exactly that.

use serde::{Deserialize, Deserializer};

pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Resolves a three-state field against the stored value.
pub fn merge<T>(patch: Option<Option<T>>, current: Option<T>) -> Option<T> {
    match patch {
        Some(value) => value,
        None => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "nullable")]
        team: Option<Option<u32>>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let absent: Body = serde_json::from_str("{}").unwrap();
        let cleared: Body = serde_json::from_str(r#"{"team":null}"#).unwrap();
        let set: Body = serde_json::from_str(r#"{"team":7}"#).unwrap();

        assert_eq!(absent.team, None);
        assert_eq!(cleared.team, Some(None));
        assert_eq!(set.team, Some(Some(7)));
    }

    #[test]
    fn test_merge_keeps_clears_or_sets() {
        assert_eq!(merge(None, Some(3)), Some(3));
        assert_eq!(merge(Some(None), Some(3)), None);
        assert_eq!(merge(Some(Some(9)), Some(3)), Some(9));
    }
}

//! Deserializers for loosely typed third-party JSON.
//!
//! A `null` or mistyped field becomes its default, and a list item that is not
//! the expected shape is skipped, so one bad entry never discards a listing.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};

/// The field's value, or `T::default()` when it is null or the wrong type.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Every item that deserializes; an absent, null or non-array list is empty.
pub(crate) fn items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values: Vec<serde_json::Value> = or_default(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| T::deserialize(value).ok())
        .collect())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Item {
        #[serde(deserialize_with = "or_default")]
        name: String,
        #[serde(deserialize_with = "or_default")]
        count: i64,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct List {
        #[serde(deserialize_with = "items")]
        items: Vec<Item>,
    }

    #[test]
    fn null_and_mistyped_fields_default() {
        let item: Item = serde_json::from_value(json!({"name": null, "count": "seven"})).unwrap();
        assert_eq!(item, Item::default());
    }

    #[test]
    fn malformed_items_are_skipped() {
        let list: List = serde_json::from_value(json!({"items": [
            {"name": "a", "count": 1},
            null,
            "junk",
            {"name": 5, "count": 2},
        ]}))
        .unwrap();
        assert_eq!(list.items, vec![
            Item {
                name: "a".into(),
                count: 1,
            },
            Item {
                name: String::new(),
                count: 2,
            },
        ]);
    }

    #[test]
    fn null_or_missing_list_is_empty() {
        let list: List = serde_json::from_value(json!({"items": null})).unwrap();
        assert!(list.items.is_empty());
        let list: List = serde_json::from_value(json!({})).unwrap();
        assert!(list.items.is_empty());
    }
}

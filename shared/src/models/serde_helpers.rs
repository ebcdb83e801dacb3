//! Common serde helpers for handling loosely typed rows from the row store
//!
//! Rows come back as JSON; nullable booleans and ids that may be numeric
//! or textual are normalized here so the typed records stay strict.

use serde::{Deserialize, Deserializer};

/// Deserialize bool that treats null as false
pub fn bool_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|opt| opt.unwrap_or(false))
}

/// Deserialize an id that may be stored as a string or an integer
pub fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct FlexibleVisitor;

    impl<'de> Visitor<'de> for FlexibleVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value.is_empty() {
                return Err(de::Error::custom("empty id"));
            }
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(FlexibleVisitor)
}

/// Deserialize an optional value, reading null or unrecognized input as `None`
pub fn lenient_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

/// Deserialize an optional id that may be stored as a string or an integer
pub fn flexible_id_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(
        Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "flexible_id")]
        id: String,
        #[serde(default, deserialize_with = "bool_false")]
        flag: bool,
        #[serde(default, deserialize_with = "flexible_id_opt")]
        owner: Option<String>,
    }

    #[test]
    fn test_flexible_id_accepts_string_and_number() {
        let row: Row = serde_json::from_str(r#"{"id":"a1","flag":true}"#).unwrap();
        assert_eq!(row.id, "a1");
        assert!(row.flag);

        let row: Row = serde_json::from_str(r#"{"id":42,"flag":null,"owner":7}"#).unwrap();
        assert_eq!(row.id, "42");
        assert!(!row.flag);
        assert_eq!(row.owner.as_deref(), Some("7"));
    }

    #[test]
    fn test_missing_optional_fields() {
        let row: Row = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(!row.flag);
        assert!(row.owner.is_none());
    }

    #[test]
    fn test_lenient_opt() {
        #[derive(Deserialize)]
        struct Flagged {
            #[serde(default, deserialize_with = "lenient_opt")]
            level: Option<u8>,
        }

        let row: Flagged = serde_json::from_str(r#"{"level":3}"#).unwrap();
        assert_eq!(row.level, Some(3));
        let row: Flagged = serde_json::from_str(r#"{"level":"high"}"#).unwrap();
        assert_eq!(row.level, None);
        let row: Flagged = serde_json::from_str(r#"{"level":null}"#).unwrap();
        assert_eq!(row.level, None);
        let row: Flagged = serde_json::from_str("{}").unwrap();
        assert_eq!(row.level, None);
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(serde_json::from_str::<Row>(r#"{"id":""}"#).is_err());
    }
}

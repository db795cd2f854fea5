//! Exporter fields may arrive as `{ "value": ..., "description": ... }` pairs or as bare values.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Field<T> {
    Described { value: Option<T> },
    Plain(Option<T>),
}

pub(crate) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<Field<T>>::deserialize(deserializer)? {
        Some(Field::Described { value }) | Some(Field::Plain(value)) => value,
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::deserialize")]
        depth: Option<i64>,
    }

    #[test]
    fn accepts_plain_and_described_values() {
        let plain: Probe = serde_json::from_str(r#"{"depth": 3}"#).unwrap();
        assert_eq!(plain.depth, Some(3));

        let described: Probe =
            serde_json::from_str(r#"{"depth": {"value": 4, "description": "max depth"}}"#)
                .unwrap();
        assert_eq!(described.depth, Some(4));

        let null: Probe = serde_json::from_str(r#"{"depth": {"value": null}}"#).unwrap();
        assert_eq!(null.depth, None);

        let missing: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.depth, None);
    }
}

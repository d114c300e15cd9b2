use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{ID_DELIMITER, TextId, TextKey};

/// Errors raised while splitting raw snapshot keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The raw key did not contain exactly one delimiter.
    #[error("malformed key `{raw}`: expected exactly one `{delimiter}`, found {occurrences}")]
    Malformed {
        /// Offending raw key.
        raw: String,
        /// Delimiter that was searched for.
        delimiter: String,
        /// Number of delimiter occurrences found.
        occurrences: usize,
    },
}

/// Result alias for key parsing.
pub type KeyResult<T> = Result<T, KeyError>;

/// A raw snapshot key split into its text key and stable id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyIdPair {
    /// Flattened text key without the id suffix.
    pub key: TextKey,
    /// Stable id suffix.
    pub id: TextId,
}

impl KeyIdPair {
    /// Splits `raw` on [`ID_DELIMITER`].
    pub fn parse(raw: &str) -> KeyResult<Self> {
        Self::parse_with(raw, ID_DELIMITER)
    }

    /// Splits `raw` on `delimiter`, which must occur exactly once.
    pub fn parse_with(raw: &str, delimiter: &str) -> KeyResult<Self> {
        let malformed = |occurrences| KeyError::Malformed {
            raw: raw.to_string(),
            delimiter: delimiter.to_string(),
            occurrences,
        };

        if delimiter.is_empty() {
            return Err(malformed(0));
        }

        let occurrences = raw.matches(delimiter).count();
        if occurrences != 1 {
            return Err(malformed(occurrences));
        }

        let (key, id) = raw.split_once(delimiter).ok_or_else(|| malformed(0))?;
        Ok(Self {
            key: key.to_string(),
            id: id.to_string(),
        })
    }

    /// Re-encodes the pair as `<key><delimiter><id>`.
    pub fn to_raw_with(&self, delimiter: &str) -> String {
        format!("{}{delimiter}{}", self.key, self.id)
    }
}

/// Flat map from raw key (`<key><delimiter><id>`) to text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    texts: BTreeMap<String, String>,
}

impl Snapshot {
    /// Empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens a nested JSON object into dotted keys.
    ///
    /// Only string leaves become texts; numbers, booleans and `null` are
    /// skipped. Arrays are indexed by position. Empty objects produce no keys.
    pub fn from_nested_json(value: &Value) -> Self {
        let mut texts = BTreeMap::new();
        flatten_into(&mut texts, None, value);
        Self { texts }
    }

    /// Inserts or replaces one raw key.
    pub fn insert(&mut self, raw_key: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(raw_key.into(), text.into());
    }

    /// Text stored under a raw key.
    pub fn get(&self, raw_key: &str) -> Option<&str> {
        self.texts.get(raw_key).map(String::as_str)
    }

    /// True when the raw key is present.
    pub fn contains(&self, raw_key: &str) -> bool {
        self.texts.contains_key(raw_key)
    }

    /// Number of raw keys.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// True when the snapshot holds no keys.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Raw keys and texts in sorted raw-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.texts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Drops the id suffix from every key, yielding a plain key→text map.
    ///
    /// Fails on the first malformed raw key. When two raw keys share the
    /// same text key, the one sorting last wins.
    pub fn without_ids(&self, delimiter: &str) -> KeyResult<BTreeMap<TextKey, String>> {
        let mut out = BTreeMap::new();
        for (raw, text) in &self.texts {
            let pair = KeyIdPair::parse_with(raw, delimiter)?;
            out.insert(pair.key, text.clone());
        }
        Ok(out)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            texts: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: Option<&str>, value: &Value) {
    let join = |segment: &str| match prefix {
        Some(p) => format!("{p}.{segment}"),
        None => segment.to_string(),
    };

    match value {
        Value::Object(map) => {
            for (segment, child) in map {
                flatten_into(out, Some(&join(segment)), child);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                flatten_into(out, Some(&join(&idx.to_string())), child);
            }
        }
        Value::String(text) => {
            if let Some(p) = prefix {
                out.insert(p.to_string(), text.clone());
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

//! Validation of fetched feed documents into typed records.

use crate::registry::{ChainRecord, TvlRecord};
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feed {
    Registry,
    Tvl,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Registry => write!(f, "chain registry"),
            Feed::Tvl => write!(f, "tvl feed"),
        }
    }
}

/// A feed that does not have the minimal record shape. Aborts the cycle.
#[derive(Error, Debug)]
pub enum InvalidInputError {
    #[error("{0}: expected an array of records")]
    NotAnArray(Feed),
    #[error("{feed}: record {index} has no `{field}`")]
    MissingField {
        feed: Feed,
        index: usize,
        field: &'static str,
    },
    #[error("{feed}: record {index}: {source}")]
    InvalidRecord {
        feed: Feed,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Registry records need `chainId` and `name`; everything else is optional.
pub fn parse_registry(doc: &serde_json::Value) -> Result<Vec<ChainRecord>, InvalidInputError> {
    parse_records(doc, Feed::Registry, &["chainId", "name"])
}

/// TVL records need `name`; a missing `tvl` is allowed.
pub fn parse_tvl_feed(doc: &serde_json::Value) -> Result<Vec<TvlRecord>, InvalidInputError> {
    parse_records(doc, Feed::Tvl, &["name"])
}

fn parse_records<T: DeserializeOwned>(
    doc: &serde_json::Value,
    feed: Feed,
    required: &[&'static str],
) -> Result<Vec<T>, InvalidInputError> {
    let items = doc.as_array().ok_or(InvalidInputError::NotAnArray(feed))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            for &field in required {
                if item.get(field).filter(|v| !v.is_null()).is_none() {
                    return Err(InvalidInputError::MissingField { feed, index, field });
                }
            }
            T::deserialize(item).map_err(|source| InvalidInputError::InvalidRecord {
                feed,
                index,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_must_be_array() {
        let err = parse_registry(&json!({"chains": []})).unwrap_err();
        assert!(matches!(err, InvalidInputError::NotAnArray(Feed::Registry)));
    }

    #[test]
    fn registry_record_needs_chain_id() {
        let err = parse_registry(&json!([{"name": "A", "chainId": 1}, {"name": "B"}])).unwrap_err();
        assert!(matches!(
            err,
            InvalidInputError::MissingField {
                feed: Feed::Registry,
                index: 1,
                field: "chainId"
            }
        ));
    }

    #[test]
    fn wrong_type_is_invalid_record() {
        let err = parse_registry(&json!([{"name": "A", "chainId": "one"}])).unwrap_err();
        assert!(matches!(err, InvalidInputError::InvalidRecord { index: 0, .. }));
    }

    #[test]
    fn tvl_feed_needs_name_only() {
        let recs = parse_tvl_feed(&json!([{"name": "Ethereum", "tvl": 10.5}, {"name": "X"}])).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].tvl, Some(10.5));
        let err = parse_tvl_feed(&json!([{"tvl": 1}])).unwrap_err();
        assert!(matches!(err, InvalidInputError::MissingField { feed: Feed::Tvl, .. }));
    }
}

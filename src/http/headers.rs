//! Header map comparison for asserting on mock responses.

use http::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

/// First difference found between two header maps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderMismatch {
    #[error("key counts do not match: {left} != {right}")]
    KeyCount { left: usize, right: usize },

    #[error("header {0} not found on the right")]
    Missing(HeaderName),

    #[error("header {name} value count does not match: {left} != {right}")]
    ValueCount {
        name: HeaderName,
        left: usize,
        right: usize,
    },

    #[error("header {name} value {index} does not match: {left:?} != {right:?}")]
    Value {
        name: HeaderName,
        index: usize,
        left: HeaderValue,
        right: HeaderValue,
    },
}

/// Compare two header maps key by key, value sequence by value sequence.
pub fn equal_headers(left: &HeaderMap, right: &HeaderMap) -> Result<(), HeaderMismatch> {
    if left.keys_len() != right.keys_len() {
        return Err(HeaderMismatch::KeyCount {
            left: left.keys_len(),
            right: right.keys_len(),
        });
    }

    for name in left.keys() {
        if !right.contains_key(name) {
            return Err(HeaderMismatch::Missing(name.clone()));
        }

        let lv: Vec<&HeaderValue> = left.get_all(name).iter().collect();
        let rv: Vec<&HeaderValue> = right.get_all(name).iter().collect();
        if lv.len() != rv.len() {
            return Err(HeaderMismatch::ValueCount {
                name: name.clone(),
                left: lv.len(),
                right: rv.len(),
            });
        }

        if let Some((index, (l, r))) = lv.iter().zip(&rv).enumerate().find(|(_, (l, r))| l != r) {
            return Err(HeaderMismatch::Value {
                name: name.clone(),
                index,
                left: (*l).clone(),
                right: (*r).clone(),
            });
        }
    }

    Ok(())
}

//! Unwrapping of the fixed JSON envelope BEA places around every response.
//!
//! Every reply looks like
//! `{"BEAAPI": {"Results": {"<Node>": <payload>}, "Request": {...}}}` and the
//! interesting part is always at the end of a short, operation-specific key
//! path. This module walks that path, normalizes the payload shape (BEA
//! returns a bare object instead of a one-element list when the cardinality
//! happens to be one), and recognizes the error node the service embeds in
//! otherwise well-formed bodies.

use log::warn;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Outermost envelope key.
pub const ROOT_NODE: &str = "BEAAPI";
/// Container for operation results inside the envelope.
pub const RESULTS_NODE: &str = "Results";
/// Container for the echoed request inside the envelope.
pub const REQUEST_NODE: &str = "Request";
/// Node holding the echoed request parameters.
pub const REQUEST_PARAM_NODE: &str = "RequestParam";
/// Node name BEA uses for embedded error reports.
pub const ERROR_NODE: &str = "Error";

/// An ordered sequence of key names leading to a payload node.
///
/// Constructed fresh for every call; never reused or mutated across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopePath(Vec<String>);

impl EnvelopePath {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Path to an operation's payload: `BEAAPI -> Results -> <node>`.
    pub fn results(node: &str) -> Self {
        Self::new([ROOT_NODE, RESULTS_NODE, node])
    }

    /// Path to the echoed request parameters:
    /// `BEAAPI -> Request -> RequestParam`.
    pub fn request_echo() -> Self {
        Self::new([ROOT_NODE, REQUEST_NODE, REQUEST_PARAM_NODE])
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }
}

/// Walks `path` one key at a time and returns the value at the end.
///
/// A missing key fails with [`Error::Structure`] naming the key and carrying
/// the partial structure reached so far; the partial is also logged for
/// diagnosis. This routine never retries and never substitutes a default.
pub fn unwrap_path<'a>(body: &'a Value, path: &EnvelopePath) -> Result<&'a Value> {
    let mut current = body;
    for key in path.keys() {
        match current.get(key) {
            Some(next) => current = next,
            None => {
                warn!(
                    "key `{}` absent in API response; structure reached: {}",
                    key, current
                );
                return Err(Error::Structure {
                    key: key.clone(),
                    partial: current.clone(),
                });
            }
        }
    }
    Ok(current)
}

/// Normalizes a payload node to a list of records.
///
/// BEA returns a list of objects when there are several and a bare object
/// when there is exactly one; `null` stands in for "none". Callers iterate,
/// so all three collapse to a `Vec`.
pub fn normalize_records(value: &Value) -> Result<Vec<Map<String, Value>>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map.clone()),
                other => Err(structure_error("record", other)),
            })
            .collect(),
        Value::Object(map) => Ok(vec![map.clone()]),
        Value::Null => Ok(Vec::new()),
        other => Err(structure_error("record", other)),
    }
}

fn structure_error(key: &str, partial: &Value) -> Error {
    Error::Structure {
        key: key.to_string(),
        partial: partial.clone(),
    }
}

/// Checks a decoded body for BEA's embedded error node.
///
/// The service reports problems inside a 200 response, as
/// `Results.Error` (or `Error` directly under the envelope root) with
/// `APIErrorCode`/`APIErrorDescription`. The per-minute quota errors get
/// their own variant so callers can wait and retry; everything else maps to
/// [`Error::Api`].
pub fn check_api_error(body: &Value) -> Result<()> {
    let error_node = body
        .get(ROOT_NODE)
        .and_then(|root| {
            root.get(RESULTS_NODE)
                .and_then(|results| results.get(ERROR_NODE))
                .or_else(|| root.get(ERROR_NODE))
        })
        .and_then(Value::as_object);

    let Some(node) = error_node else {
        return Ok(());
    };

    let report: ApiErrorNode =
        serde_json::from_value(Value::Object(node.clone())).unwrap_or_default();
    let code = report.code.unwrap_or_default();
    let message = report.description.unwrap_or_default();

    if is_quota_message(&message) {
        return Err(Error::RateLimited(message));
    }
    // Some error replies use unexpected field types; fall back to the raw
    // node so the report is never empty.
    let message = if message.is_empty() {
        Value::Object(node.clone()).to_string()
    } else {
        message
    };
    Err(Error::Api { code, message })
}

#[derive(Debug, Default, serde::Deserialize)]
struct ApiErrorNode {
    #[serde(default, rename = "APIErrorCode")]
    code: Option<String>,
    #[serde(default, rename = "APIErrorDescription")]
    description: Option<String>,
}

fn is_quota_message(message: &str) -> bool {
    // BEA enforces per-minute call/error/volume limits and answers every
    // call with an explanatory message until the minute expires. The exact
    // wording has drifted over the years, so match loosely.
    let m = message.to_lowercase();
    m.contains("request limit") || (m.contains("exceeded") && m.contains("minute"))
}

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::time::Duration;

use crate::config::load_config;
use crate::envelope::{self, EnvelopePath};
use crate::error::{Error, Result};
use crate::operation::Operation;

/// The only response encoding this crate requests or understands.
///
/// BEA also serves XML; there is no support for it here.
pub const RESULT_FORMAT: &str = "JSON";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base BEA API URL, typically `https://apps.bea.gov/api/data/`.
    pub url: String,
    /// 36-character BEA API key (`UserID`).
    pub key: String,
}

/// Blocking client for the BEA data API.
///
/// Connection settings are fixed at construction; every call builds its own
/// query string and envelope path, issues one GET, and unwraps the reply.
/// The client performs no retry, backoff, or quota accounting - BEA's
/// per-minute limits are left to the caller.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    key: String,

    timeout: Duration,

    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.beaapirc`.
    ///
    /// This is equivalent to `Client::new(None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`key` arguments
    /// - environment variables `BEA_API_URL` / `BEA_API_KEY`
    /// - rc file from `BEA_API_RC` or `.beaapirc`
    pub fn new(url: Option<String>, key: Option<String>) -> Result<Self> {
        let cfg = load_config(url, key)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("beaapi-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("beaapi-rs")),
        );

        let http = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            url: cfg.url,
            key: cfg.key,
            timeout: Duration::from_secs(60),
            http,
        })
    }

    /// Per-call deadline. Defaults to 60 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks that the configured base URL answers at all.
    pub fn ping(&self) -> Result<()> {
        let resp = self.http.get(&self.url).timeout(self.timeout).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport {
                status,
                url: resp.url().to_string(),
            });
        }
        Ok(())
    }

    /// Retrieves the list of datasets the service exposes.
    ///
    /// Equivalent to BEA's `GetDatasetList`; the payload is the raw
    /// `Dataset` node (a list of descriptor mappings).
    pub fn dataset_list(&self) -> Result<Value> {
        self.fetch(&Operation::DatasetList)
    }

    /// Retrieves the parameters of one dataset (`GetParameterList`).
    pub fn parameter_list(&self, dataset: &str) -> Result<Value> {
        self.fetch(&Operation::ParameterList {
            dataset: dataset.to_string(),
        })
    }

    /// Retrieves the permitted values of one parameter
    /// (`GetParameterValues`).
    pub fn parameter_values(&self, dataset: &str, parameter: &str) -> Result<Value> {
        self.fetch(&Operation::ParameterValues {
            dataset: dataset.to_string(),
            parameter: parameter.to_string(),
        })
    }

    /// Retrieves permitted values restricted to one table
    /// (`GetParameterValuesFiltered`).
    pub fn parameter_values_filtered(
        &self,
        dataset: &str,
        target_parameter: &str,
        table_name: &str,
    ) -> Result<Value> {
        self.fetch(&Operation::ParameterValuesFiltered {
            dataset: dataset.to_string(),
            target_parameter: target_parameter.to_string(),
            table_name: table_name.to_string(),
        })
    }

    /// Retrieves statistics from one dataset (`GetData`).
    ///
    /// `selectors` are the dataset-specific query parameters BEA expects,
    /// e.g. `[("TableName", "T10101"), ("Frequency", "Q"), ("Year", "2024")]`.
    pub fn data(&self, dataset: &str, selectors: &[(&str, &str)]) -> Result<Value> {
        self.fetch(&Operation::Data {
            dataset: dataset.to_string(),
            selectors: selectors
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    /// Issues one operation and returns its unwrapped payload.
    pub fn fetch(&self, op: &Operation) -> Result<Value> {
        let body = self.get_body(op)?;
        unwrap_payload(&body, op)
    }

    /// Like [`Client::fetch`], but also unwraps the request parameters the
    /// service echoed back, returning `(echo, payload)`. Useful for
    /// verifying what was actually sent.
    pub fn fetch_echoed(&self, op: &Operation) -> Result<(Value, Value)> {
        let body = self.get_body(op)?;
        let payload = unwrap_payload(&body, op)?;
        let echo = envelope::unwrap_path(&body, &EnvelopePath::request_echo())?.clone();
        Ok((echo, payload))
    }

    fn get_body(&self, op: &Operation) -> Result<Value> {
        let mut pairs: Vec<(String, String)> = vec![
            ("UserID".into(), self.key.clone()),
            ("method".into(), op.method().into()),
        ];
        pairs.extend(op.query_pairs());
        pairs.push(("ResultFormat".into(), RESULT_FORMAT.into()));

        debug!("GET {} method={}", self.url, op.method());
        let resp = self
            .http
            .get(&self.url)
            .query(&pairs)
            .timeout(self.timeout)
            .send()?;

        let status = resp.status();
        let url = resp.url().to_string();
        if !status.is_success() {
            // The body is not read on a transport failure.
            return Err(Error::Transport { status, url });
        }

        let text = resp.text()?;
        decode_response(status, &url, &text)
    }
}

/// Decodes a response body to JSON, gated on the HTTP status.
///
/// Split out from the transport so the status-gating behavior is testable
/// without a server: a non-success status must fail before the body is
/// even parsed.
pub(crate) fn decode_response(status: StatusCode, url: &str, text: &str) -> Result<Value> {
    if !status.is_success() {
        return Err(Error::Transport {
            status,
            url: url.to_string(),
        });
    }
    debug!("decoding API response (url={}, status={})", url, status);
    let body: Value = serde_json::from_str(text)?;
    Ok(body)
}

/// Unwraps one operation's payload from a decoded body:
/// recognize an embedded error node first, then walk
/// `BEAAPI -> Results -> <node>`.
pub(crate) fn unwrap_payload(body: &Value, op: &Operation) -> Result<Value> {
    envelope::check_api_error(body)?;
    let path = EnvelopePath::results(op.result_node());
    Ok(envelope::unwrap_path(body, &path)?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dataset_list_payload_unwraps_from_a_simulated_body() {
        let body = json!({"BEAAPI": {"Results": {"Dataset": [
            {"DatasetName": "A"}, {"DatasetName": "B"}
        ]}}});
        let payload = unwrap_payload(&body, &Operation::DatasetList).unwrap();
        assert_eq!(
            payload,
            json!([{"DatasetName": "A"}, {"DatasetName": "B"}])
        );
    }

    #[test]
    fn non_success_status_fails_before_the_body_is_parsed() {
        // The body is deliberately not JSON; a Transport error proves it
        // was never handed to the decoder.
        let result = decode_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "https://apps.bea.gov/api/data/",
            "<html>503</html>",
        );
        match result {
            Err(Error::Transport { status, url }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(url, "https://apps.bea.gov/api/data/");
            }
            other => panic!("expected Transport error, got {:?}", other),
        }
    }

    #[test]
    fn success_status_decodes_the_body() {
        let body = decode_response(
            StatusCode::OK,
            "https://apps.bea.gov/api/data/",
            r#"{"BEAAPI": {"Results": {"Dataset": []}}}"#,
        )
        .unwrap();
        assert!(body.get("BEAAPI").is_some());
    }

    #[test]
    fn embedded_error_node_wins_over_unwrapping() {
        let body = json!({"BEAAPI": {"Results": {"Error": {
            "APIErrorCode": "21",
            "APIErrorDescription": "The dataset requested does not exist."
        }}}});
        assert!(matches!(
            unwrap_payload(&body, &Operation::DatasetList),
            Err(Error::Api { .. })
        ));
    }

    #[test]
    fn missing_results_node_is_a_structure_error() {
        let body = json!({"BEAAPI": {"Request": {}}});
        assert!(matches!(
            unwrap_payload(&body, &Operation::DatasetList),
            Err(Error::Structure { .. })
        ));
    }
}

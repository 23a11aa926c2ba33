//! Query transport and response envelope.
//!
//! The transport seam is a trait so the store can be driven by an HTTP
//! backend in the application and by mocks in tests. Transport-level
//! failures (network errors, non-2xx, undecodable bodies) surface as `Err`;
//! application-level errors ride inside a successful [`Envelope`].

use std::time::Duration;

use async_trait::async_trait;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::BackendConfig;
use crate::query::Operation;

/// One entry of a response's `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The raw response body of a query: a `data` payload, an `errors` array,
/// or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
}

/// An envelope viewed as a tagged result, decided by the `errors` field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryOutcome<'a> {
    Data(&'a Value),
    Errors(&'a [ErrorDetail]),
}

static NULL: Value = Value::Null;

impl Envelope {
    /// The errors carried by this envelope, if there are any.
    ///
    /// An absent or empty `errors` array both count as "no errors".
    #[must_use]
    pub fn errors(&self) -> Option<&[ErrorDetail]> {
        self.errors.as_deref().filter(|errors| !errors.is_empty())
    }

    /// Whether this envelope reports an application-level error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.errors().is_some()
    }

    /// View the envelope as a tagged result for exhaustive matching.
    #[must_use]
    pub fn outcome(&self) -> QueryOutcome<'_> {
        self.errors().map_or_else(
            || QueryOutcome::Data(self.data.as_ref().unwrap_or(&NULL)),
            QueryOutcome::Errors,
        )
    }

    /// Decode a named member of the `data` payload.
    ///
    /// # Errors
    /// Returns an error when `data` is absent, the member is missing, or it
    /// does not deserialize into `T`. Callers should check [`Self::errors`]
    /// first; an error envelope has no payload to decode.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| eyre!("response carries no data payload"))?;
        let member = data
            .get(name)
            .ok_or_else(|| eyre!("response data has no `{name}` member"))?;
        serde_json::from_value(member.clone())
            .map_err(|e| eyre!("failed to decode `{name}`: {e}"))
    }
}

/// Asynchronous transport for named query operations.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Execute the operation with the given variables and return the raw
    /// response envelope.
    ///
    /// # Errors
    /// Returns an error on transport-level failure only. A response whose
    /// body carries an `errors` array is still `Ok`.
    async fn query(&self, operation: Operation, variables: Value) -> Result<Envelope>;
}

/// HTTP transport posting GraphQL requests to the backend endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport for the configured backend.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.url.clone(),
        })
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn query(&self, operation: Operation, variables: Value) -> Result<Envelope> {
        let body = json!({
            "query": operation.document(),
            "variables": variables,
        });

        debug!(operation = operation.name(), "sending query");

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(eyre!(
                "query {} failed: HTTP {}",
                operation.name(),
                response.status()
            ));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_error_envelope_outcome() {
        let envelope: Envelope =
            serde_json::from_value(json!({"errors": [{"message": "boom"}]})).unwrap();

        assert!(envelope.is_error());
        match envelope.outcome() {
            QueryOutcome::Errors(errors) => {
                assert_eq!(errors, [ErrorDetail::new("boom")]);
            }
            QueryOutcome::Data(_) => panic!("expected an error outcome"),
        }
    }

    #[test]
    fn test_empty_errors_array_is_success() {
        let envelope: Envelope =
            serde_json::from_value(json!({"data": {"services": []}, "errors": []})).unwrap();

        assert!(!envelope.is_error());
        assert!(matches!(envelope.outcome(), QueryOutcome::Data(_)));
    }

    #[test]
    fn test_field_decodes_data_member() {
        let envelope: Envelope = serde_json::from_value(json!({
            "data": {"services": [{"value": "1", "label": "svcA"}]}
        }))
        .unwrap();

        let services: Vec<crate::model::SelectorOption> = envelope.field("services").unwrap();
        assert_eq!(services, [crate::model::SelectorOption::new("1", "svcA")]);
    }

    #[test]
    fn test_field_on_missing_member_fails() {
        let envelope: Envelope = serde_json::from_value(json!({"data": {}})).unwrap();
        let result: Result<Vec<crate::model::SelectorOption>> = envelope.field("services");
        assert!(result.is_err());
    }
}

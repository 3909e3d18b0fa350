//! # HTTP DID Registry Client

use std::fmt::Display;
use std::time::Duration;

use did_vc::error::Err;
use did_vc::{tracerr, DidClient, DidDocument, Resolution, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

// Error response. Allow dead code because we can't control the struct coming from the API but
// don't use all the fields.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct ErrorResponse {
    request_id: Option<String>,
    date: Option<String>,
    error: Option<ErrorResponseDetail>,
}

// Error details in the error response. Allow dead code because we can't control the struct coming
// from the API but don't need all the fields.
#[derive(Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct ErrorResponseDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Display for ErrorResponseDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        serde_json::to_string(self).map_err(|_| std::fmt::Error)?.fmt(f)
    }
}

/// Retry behaviour for registry requests. Retries apply to transport failures and server errors
/// (5xx); client errors are returned immediately.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry. Doubles on each subsequent retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, backoff: Duration::from_millis(250) }
    }
}

/// DID registry client that resolves DIDs over HTTP.
///
/// The registry is expected to serve `GET {resolution_url}/{did}` and respond with either a W3C
/// resolution envelope or a bare DID document as JSON.
pub struct HttpDidClient {
    resolution_url: String,
    /// Reusable HTTP client
    http_client: reqwest::Client,
    retry: RetryPolicy,
}

/// Configuration and internal implementation for the registry client.
impl HttpDidClient {
    /// Constructor.
    ///
    /// # Arguments
    ///
    /// * `resolution_url` - Base URL of the registry's resolution endpoint, with or without a
    ///   trailing slash. e.g. "https://beta.discover.did.microsoft.com/1.0/identifiers".
    #[must_use]
    pub fn new(resolution_url: &str) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("failed to create HTTP client.");
        Self {
            resolution_url: resolution_url.to_string(),
            http_client,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the default retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // The registry serves documents at {resolution_url}/{did}. The DID is itself a URI, so it
    // cannot go through Url::join, which would treat it as an absolute URL and discard the base.
    fn resolution_url_for(&self, did: &str) -> Result<Url> {
        let url = format!("{}/{}", self.resolution_url.trim_end_matches('/'), did);
        match Url::parse(&url) {
            Ok(url) => Ok(url),
            Err(e) => tracerr!(Err::InvalidConfig, "invalid resolution endpoint: {}", e),
        }
    }

    // Issue the GET, retrying transport failures and server errors per the retry policy. The
    // final attempt's response is returned as-is for the caller to unpack.
    async fn get_with_retry(&self, url: Url) -> Result<reqwest::Response> {
        let mut backoff = self.retry.backoff;
        let mut attempts_left = self.retry.max_retries;
        loop {
            match self.http_client.get(url.clone()).send().await {
                Ok(res) if res.status().is_server_error() && attempts_left > 0 => {
                    tracing::warn!("registry returned {}, retrying", res.status());
                }
                Ok(res) => return Ok(res),
                Err(e) => {
                    if attempts_left == 0 {
                        tracerr!(
                            Err::RequestError,
                            "failed to call DID resolution endpoint: {}",
                            e
                        );
                    }
                    tracing::warn!("failed to call DID resolution endpoint, retrying: {}", e);
                }
            }
            attempts_left -= 1;
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }
}

#[allow(async_fn_in_trait)]
impl DidClient for HttpDidClient {
    async fn resolve(&self, did: &str) -> Result<Option<DidDocument>> {
        let url = self.resolution_url_for(did)?;
        let res = self.get_with_retry(url).await?;

        if res.status() == StatusCode::NOT_FOUND {
            tracing::trace!("DID not found in registry: {}", did);
            return Ok(None);
        }
        if !res.status().is_success() {
            match res.json::<ErrorResponse>().await {
                Ok(e) => match e.error {
                    Some(e) => tracerr!(Err::ApiError, "{}", e),
                    None => tracerr!(Err::ApiError, "error response but no detail provided"),
                },
                Err(e) => tracerr!(
                    Err::DeserializationError,
                    "failed to deserialize error response: {}",
                    e
                ),
            }
        }

        let body = match res.json::<serde_json::Value>().await {
            Ok(body) => body,
            Err(e) => tracerr!(
                Err::DeserializationError,
                "failed to deserialize successful response: {}",
                e
            ),
        };
        unpack_document(body)
    }
}

// Registries differ in what a successful resolution returns: a W3C resolution envelope or the
// bare DID document. Distinguish by the presence of envelope keys.
fn unpack_document(body: serde_json::Value) -> Result<Option<DidDocument>> {
    if body.get("didDocument").is_some() || body.get("didResolutionMetadata").is_some() {
        let resolution: Resolution = match serde_json::from_value(body) {
            Ok(resolution) => resolution,
            Err(e) => tracerr!(
                Err::DeserializationError,
                "failed to deserialize resolution envelope: {}",
                e
            ),
        };
        if let Some(metadata) = &resolution.did_resolution_metadata {
            if metadata.error.as_deref() == Some("notFound") {
                tracing::trace!("registry resolution metadata reports notFound");
                return Ok(None);
            }
            if let Some(error) = &metadata.error {
                tracerr!(Err::ApiError, "registry reported a resolution error: {}", error);
            }
        }
        let Some(document) = resolution.did_document else {
            tracerr!(Err::DeserializationError, "resolution envelope contains no DID document");
        };
        return Ok(Some(document));
    }

    if body.get("id").is_some() {
        return match serde_json::from_value(body) {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                tracerr!(Err::DeserializationError, "failed to deserialize DID document: {}", e)
            }
        };
    }
    tracerr!(
        Err::DeserializationError,
        "response is neither a resolution envelope nor a DID document"
    )
}

#[cfg(test)]
mod tests {
    use did_vc::test_utils::{sample_document, TEST_DID};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn no_retry() -> RetryPolicy {
        RetryPolicy { max_retries: 0, backoff: Duration::from_millis(1) }
    }

    fn did_path() -> String {
        format!("/identifiers/{TEST_DID}")
    }

    async fn client_for(server: &MockServer) -> HttpDidClient {
        HttpDidClient::new(&format!("{}/identifiers", server.uri())).with_retry(no_retry())
    }

    #[tokio::test]
    async fn resolves_envelope_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "@context": "https://w3id.org/did-resolution/v1",
                "didDocument": sample_document(TEST_DID),
                "didDocumentMetadata": {"created": "2020-12-20T19:17:47Z"},
                "didResolutionMetadata": {"contentType": "application/did+ld+json"}
            })))
            .mount(&server)
            .await;

        let document = client_for(&server)
            .await
            .resolve(TEST_DID)
            .await
            .expect("should resolve")
            .expect("should find a document");
        assert_eq!(document.id, TEST_DID);
        assert_eq!(document.verification_method.expect("should have methods").len(), 1);
    }

    #[tokio::test]
    async fn resolves_bare_document_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_document(TEST_DID)))
            .mount(&server)
            .await;

        let document = client_for(&server)
            .await
            .resolve(TEST_DID)
            .await
            .expect("should resolve")
            .expect("should find a document");
        assert_eq!(document.id, TEST_DID);
    }

    #[tokio::test]
    async fn trailing_slash_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_document(TEST_DID)))
            .mount(&server)
            .await;

        let client = HttpDidClient::new(&format!("{}/identifiers/", server.uri()))
            .with_retry(no_retry());
        let document = client.resolve(TEST_DID).await.expect("should resolve");
        assert!(document.is_some());
    }

    #[tokio::test]
    async fn registry_404_is_absence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let document = client_for(&server).await.resolve(TEST_DID).await.expect("should resolve");
        assert!(document.is_none());
    }

    #[tokio::test]
    async fn envelope_not_found_is_absence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "didDocument": null,
                "didResolutionMetadata": {"error": "notFound"}
            })))
            .mount(&server)
            .await;

        let document = client_for(&server).await.resolve(TEST_DID).await.expect("should resolve");
        assert!(document.is_none());
    }

    #[tokio::test]
    async fn envelope_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "didDocument": null,
                "didResolutionMetadata": {"error": "invalidDid"}
            })))
            .mount(&server)
            .await;

        let err =
            client_for(&server).await.resolve(TEST_DID).await.expect_err("expected error");
        assert!(err.is(Err::ApiError));
        assert!(err.to_string().contains("invalidDid"));
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "requestId": "c5f9e7b8",
                "error": {"code": "internal_error", "message": "registry on fire"}
            })))
            .mount(&server)
            .await;

        let err =
            client_for(&server).await.resolve(TEST_DID).await.expect_err("expected error");
        assert!(err.is(Err::ApiError));
        assert!(err.to_string().contains("internal_error"));
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_document(TEST_DID)))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpDidClient::new(&format!("{}/identifiers", server.uri()))
            .with_retry(RetryPolicy { max_retries: 2, backoff: Duration::from_millis(5) });
        let document = client.resolve(TEST_DID).await.expect("should resolve");
        assert!(document.is_some());
    }

    #[tokio::test]
    async fn retries_exhausted_surface_final_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"code": "internal_error"}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = HttpDidClient::new(&format!("{}/identifiers", server.uri()))
            .with_retry(RetryPolicy { max_retries: 1, backoff: Duration::from_millis(5) });
        let err = client.resolve(TEST_DID).await.expect_err("expected error");
        assert!(err.is(Err::ApiError));
    }

    #[tokio::test]
    async fn malformed_success_body_is_deserialization_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(did_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hello": "world"})))
            .mount(&server)
            .await;

        let err =
            client_for(&server).await.resolve(TEST_DID).await.expect_err("expected error");
        assert!(err.is(Err::DeserializationError));
    }

    #[tokio::test]
    async fn unreachable_registry_is_request_error() {
        let client = HttpDidClient::new("http://127.0.0.1:1/identifiers").with_retry(no_retry());
        let err = client.resolve(TEST_DID).await.expect_err("expected error");
        assert!(err.is(Err::RequestError));
    }

    #[tokio::test]
    async fn unparseable_resolution_url_is_config_error() {
        let client = HttpDidClient::new("not a url").with_retry(no_retry());
        let err = client.resolve(TEST_DID).await.expect_err("expected error");
        assert!(err.is(Err::InvalidConfig));
    }
}

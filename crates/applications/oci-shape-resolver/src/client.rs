//! OCI Core Services client
//!
//! Implements [`RemoteShapeSource`] over the compute management REST API:
//!
//! ```text
//! GET /20160918/instanceConfigurations/{instanceConfigurationId}
//! GET /20160918/shapes?compartmentId={compartmentId}[&page={opc-next-page}]
//! ```
//!
//! Request signing is not handled here. Callers that talk to OCI directly
//! inject a `reqwest::Client` configured for it (or point the endpoint at a
//! signing proxy).

use crate::config::OciClientConfig;
use async_trait::async_trait;
use oci_shape_core::{InstanceLaunchConfig, RemoteShapeSource, ShapeCatalogEntry, ShapeSourceError};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

/// Core Services API version path segment
const API_VERSION: &str = "20160918";

/// Header carrying the pagination token
const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// Header carrying the client request id
const REQUEST_ID_HEADER: &str = "opc-request-id";

/// Error body returned by OCI services
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    code: String,
    message: String,
}

/// HTTP-backed remote shape source
#[derive(Debug, Clone)]
pub struct OciComputeClient {
    /// HTTP client
    http: reqwest::Client,

    /// Endpoint without trailing slash; resource paths are appended as encoded segments
    endpoint: String,
}

impl OciComputeClient {
    /// Create a client with its own HTTP client
    pub fn new(config: &OciClientConfig) -> Result<Self, ShapeSourceError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| ShapeSourceError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(config, http))
    }

    /// Create a client around a pre-configured HTTP client
    pub fn with_http_client(config: &OciClientConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Versioned resource URL; each segment is percent-encoded
    fn resource_url(&self, segments: &[&str]) -> Result<Url, ShapeSourceError> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            ShapeSourceError::config(format!("Invalid endpoint {}: {e}", self.endpoint))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ShapeSourceError::config(format!("Endpoint {} cannot be a base URL", self.endpoint))
            })?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(segments);

        Ok(url)
    }

    /// Send a GET and decode the body; returns the next-page token alongside
    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<(T, Option<String>), ShapeSourceError> {
        let url = self.resource_url(segments)?;
        let request_id = Uuid::new_v4().simple().to_string();

        debug!(url = %url, opc_request_id = %request_id, "Sending OCI request");

        let response = self
            .http
            .get(url.clone())
            .query(query)
            .header(REQUEST_ID_HEADER, &request_id)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ShapeSourceError::network(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        let next_page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| ShapeSourceError::network(format!("Reading {url} failed: {e}")))?;

        if !status.is_success() {
            debug!(
                url = %url,
                opc_request_id = %request_id,
                status = status.as_u16(),
                "OCI request failed"
            );
            return Err(service_error(status, &body));
        }

        let value = serde_json::from_slice(&body)
            .map_err(|e| ShapeSourceError::decode(format!("Invalid response from {url}: {e}")))?;

        Ok((value, next_page))
    }
}

fn service_error(status: reqwest::StatusCode, body: &[u8]) -> ShapeSourceError {
    match serde_json::from_slice::<ServiceErrorBody>(body) {
        Ok(err) => ShapeSourceError::service(status.as_u16(), err.code, err.message),
        Err(_) => ShapeSourceError::service(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            String::from_utf8_lossy(body),
        ),
    }
}

#[async_trait]
impl RemoteShapeSource for OciComputeClient {
    async fn get_instance_configuration(
        &self,
        instance_configuration_id: &str,
    ) -> oci_shape_core::Result<InstanceLaunchConfig> {
        let (config, _) = self
            .get_json(&["instanceConfigurations", instance_configuration_id], &[])
            .await?;
        Ok(config)
    }

    async fn list_shapes(&self, compartment_id: &str) -> oci_shape_core::Result<Vec<ShapeCatalogEntry>> {
        let mut shapes = Vec::new();
        let mut page: Option<String> = None;

        loop {
            let mut query = vec![("compartmentId", compartment_id)];
            if let Some(token) = page.as_deref() {
                query.push(("page", token));
            }

            let (batch, next): (Vec<ShapeCatalogEntry>, _) = self.get_json(&["shapes"], &query).await?;
            shapes.extend(batch);

            match next {
                Some(token) => page = Some(token),
                None => break,
            }
        }

        debug!(
            compartment_id = %compartment_id,
            shape_count = shapes.len(),
            "Listed shapes"
        );

        Ok(shapes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use oci_shape_core::InstanceDetails;

    fn client(server: &MockServer) -> OciComputeClient {
        OciComputeClient::new(&OciClientConfig::with_endpoint(server.base_url())).unwrap()
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = OciComputeClient::new(&OciClientConfig::with_endpoint(
            "https://iaas.us-phoenix-1.oraclecloud.com/",
        ))
        .unwrap();

        assert_eq!(client.endpoint(), "https://iaas.us-phoenix-1.oraclecloud.com");
    }

    #[tokio::test]
    async fn test_get_instance_configuration() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/20160918/instanceConfigurations/ocid1.instanceconfiguration.oc1..abc")
                .header_exists("opc-request-id");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{
                        "id": "ocid1.instanceconfiguration.oc1..abc",
                        "compartmentId": "ocid1.compartment.oc1..c1",
                        "instanceDetails": {
                            "instanceType": "compute",
                            "launchDetails": { "shape": "VM.Standard2.1" }
                        }
                    }"#,
                );
        });

        let config = client(&server)
            .get_instance_configuration("ocid1.instanceconfiguration.oc1..abc")
            .await
            .unwrap();

        assert_eq!(config.compartment_id, "ocid1.compartment.oc1..c1");
        assert!(matches!(config.instance_details, Some(InstanceDetails::Compute(_))));
        mock.assert();
    }

    #[tokio::test]
    async fn test_service_error_is_decoded() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(GET).path("/20160918/instanceConfigurations/missing");
            then.status(404)
                .header("content-type", "application/json")
                .body(r#"{"code": "NotAuthorizedOrNotFound", "message": "Authorization failed or requested resource not found."}"#);
        });

        let err = client(&server)
            .get_instance_configuration("missing")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ShapeSourceError::service(
                404,
                "NotAuthorizedOrNotFound",
                "Authorization failed or requested resource not found."
            )
        );
        mock.assert();
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/20160918/instanceConfigurations/broken");
            then.status(502).body("Bad Gateway");
        });

        let err = client(&server)
            .get_instance_configuration("broken")
            .await
            .unwrap_err();

        assert_eq!(err, ShapeSourceError::service(502, "Bad Gateway", "Bad Gateway"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/20160918/instanceConfigurations/garbled");
            then.status(200)
                .header("content-type", "application/json")
                .body("this is not valid json");
        });

        let err = client(&server)
            .get_instance_configuration("garbled")
            .await
            .unwrap_err();

        assert!(matches!(err, ShapeSourceError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_list_shapes_follows_pages() {
        let server = MockServer::start();

        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/20160918/shapes")
                .query_param("compartmentId", "ocid1.compartment.oc1..c1")
                .query_param_missing("page");
            then.status(200)
                .header("content-type", "application/json")
                .header("opc-next-page", "page-2")
                .body(r#"[{"shape": "VM.Standard2.1", "ocpus": 1, "memoryInGBs": 15}]"#);
        });

        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/20160918/shapes")
                .query_param("compartmentId", "ocid1.compartment.oc1..c1")
                .query_param("page", "page-2");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"[{"shape": "BM.GPU3.8", "ocpus": 52, "memoryInGBs": 768, "gpus": 8}]"#);
        });

        let shapes = client(&server)
            .list_shapes("ocid1.compartment.oc1..c1")
            .await
            .unwrap();

        assert_eq!(
            shapes,
            vec![
                ShapeCatalogEntry::new("VM.Standard2.1")
                    .with_ocpus(1.0)
                    .with_memory_in_gbs(15.0),
                ShapeCatalogEntry::new("BM.GPU3.8")
                    .with_ocpus(52.0)
                    .with_memory_in_gbs(768.0)
                    .with_gpus(8),
            ]
        );
        first.assert();
        second.assert();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Reserve a free port, then release it so nothing is listening there
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client =
            OciComputeClient::new(&OciClientConfig::with_endpoint(format!("http://127.0.0.1:{port}")))
                .unwrap();

        let err = client.list_shapes("c").await.unwrap_err();

        assert!(matches!(err, ShapeSourceError::Network(_)), "got {err:?}");
    }

    #[test]
    fn test_resource_url_encodes_segments() {
        let client = OciComputeClient::new(&OciClientConfig::with_endpoint(
            "https://proxy.internal/oci/",
        ))
        .unwrap();

        let url = client
            .resource_url(&["instanceConfigurations", "ocid1/../shapes?x=1"])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://proxy.internal/oci/20160918/instanceConfigurations/ocid1%2F..%2Fshapes%3Fx=1"
        );
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let client = OciComputeClient::new(&OciClientConfig::with_endpoint("not a url")).unwrap();

        let err = client.resource_url(&["shapes"]).unwrap_err();

        assert!(matches!(err, ShapeSourceError::Config(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_configuration_id_cannot_escape_its_path() {
        let server = MockServer::start();

        let escaped = server.mock(|when, then| {
            when.method(GET).path("/20160918/shapes");
            then.status(200)
                .header("content-type", "application/json")
                .body("[]");
        });

        let err = client(&server)
            .get_instance_configuration("../shapes")
            .await
            .unwrap_err();

        // Unmatched requests get the mock server's 404, not the shapes listing
        assert!(matches!(err, ShapeSourceError::Service { status: 404, .. }), "got {err:?}");
        escaped.assert_hits(0);
    }
}

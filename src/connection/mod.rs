//! Connection to a ClickHouse server
//!
//! This module provides the HTTP client that implements [`SqlExecutor`]:
//! - Statement sent as the request body, suffixed with `FORMAT JSONCompact`
//! - Bound values sent as `param_<name>` query parameters
//! - Credentials sent in `X-ClickHouse-User` / `X-ClickHouse-Key` headers
//! - Error responses decoded into [`ServerErrorInfo`]

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::error::{ExecutionError, Result, ServerErrorInfo};
use crate::executor::{ResultSet, SqlExecutor};
use crate::query::QueryPlan;

/// Output format requested from the server
const RESPONSE_FORMAT: &str = "JSONCompact";

/// Header carrying the numeric exception code on failed queries
const EXCEPTION_CODE_HEADER: &str = "X-ClickHouse-Exception-Code";

/// ClickHouse HTTP interface client
///
/// One client is created per run; requests are not retried.
pub struct ClickHouseClient {
    /// Underlying HTTP client with the query timeout applied
    http: reqwest::Client,

    /// Endpoint such as `http://localhost:8123`
    endpoint: String,

    /// User name
    user: String,

    /// Password, never logged
    password: String,

    /// Default database for unqualified names
    database: String,
}

/// Body of a `JSONCompact` response
#[derive(Debug, Deserialize)]
struct CompactResponse {
    meta: Vec<ColumnMeta>,
    data: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ColumnMeta {
    name: String,
}

impl ClickHouseClient {
    /// Create a client from connection settings
    ///
    /// # Arguments
    /// * `config` - Connection configuration
    ///
    /// # Returns
    /// * `Result<Self>` - New client, or error if the HTTP client cannot be built
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.query_timeout())
            .build()
            .map_err(ExecutionError::from)?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            user: config.user.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
        })
    }

    /// Query parameters for a plan
    ///
    /// Bound values travel as `param_<name>`; the server substitutes them
    /// into the typed placeholders of the statement.
    fn request_params(&self, plan: &QueryPlan) -> Vec<(String, String)> {
        let mut params = vec![
            ("database".to_string(), self.database.clone()),
            // unmatched LEFT JOIN columns read as NULL instead of type defaults
            ("join_use_nulls".to_string(), "1".to_string()),
            ("wait_end_of_query".to_string(), "1".to_string()),
        ];
        params.extend(
            plan.parameters()
                .iter()
                .map(|(name, value)| (format!("param_{name}"), value.clone())),
        );
        params
    }

    /// Request body for a plan
    fn request_body(plan: &QueryPlan) -> String {
        format!(
            "{}\nFORMAT {RESPONSE_FORMAT}",
            plan.statement().trim_end().trim_end_matches(';')
        )
    }
}

/// Decode a `JSONCompact` body into a result set
///
/// # Arguments
/// * `body` - Response body text
///
/// # Returns
/// * `Result<ResultSet, ExecutionError>` - Columns in server order and rows
pub fn parse_response(body: &str) -> std::result::Result<ResultSet, ExecutionError> {
    let response: CompactResponse = serde_json::from_str(body)
        .map_err(|e| ExecutionError::InvalidResponse(e.to_string()))?;

    let columns = response.meta.into_iter().map(|m| m.name).collect();
    ResultSet::new(columns, response.data)
}

/// Hide credentials embedded in an endpoint URL
///
/// # Arguments
/// * `endpoint` - URL that may contain `user:password@`
///
/// # Returns
/// * `String` - URL with credentials replaced by ***
pub fn sanitize_endpoint(endpoint: &str) -> String {
    if let Some(proto_end) = endpoint.find("://") {
        let rest = &endpoint[proto_end + 3..];
        let authority_end = rest.find('/').unwrap_or(rest.len());
        if let Some(at) = rest[..authority_end].rfind('@') {
            return format!("{}***{}", &endpoint[..proto_end + 3], &rest[at..]);
        }
    }
    endpoint.to_string()
}

fn exception_code(headers: &HeaderMap) -> Option<String> {
    headers
        .get(EXCEPTION_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl SqlExecutor for ClickHouseClient {
    async fn execute(&self, plan: &QueryPlan) -> std::result::Result<ResultSet, ExecutionError> {
        tracing::debug!("Sending query to {}", self.describe());

        let response = self
            .http
            .post(&self.endpoint)
            .query(&self.request_params(plan))
            .header("X-ClickHouse-User", &self.user)
            .header("X-ClickHouse-Key", &self.password)
            .body(Self::request_body(plan))
            .send()
            .await?;

        let status = response.status();
        let code = exception_code(response.headers());
        let body = response.text().await?;

        if !status.is_success() {
            let info = ServerErrorInfo::from_response(code.as_deref(), &body);
            tracing::debug!("Server rejected query: {info}");
            return Err(ExecutionError::Server {
                status: status.as_u16(),
                info,
            });
        }

        tracing::debug!("Received {} bytes", body.len());
        parse_response(&body)
    }

    fn describe(&self) -> String {
        format!(
            "clickhouse {} as {} (database {})",
            sanitize_endpoint(&self.endpoint),
            self.user,
            self.database
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use crate::query::{FilterSpec, QueryBuilder};

    fn client() -> ClickHouseClient {
        let config = ConnectionConfig {
            password: "secret".to_string(),
            ..ConnectionConfig::default()
        };
        ClickHouseClient::new(&config).unwrap()
    }

    fn plan() -> QueryPlan {
        let spec = FilterSpec::create("Delhi", Some("BIKE")).unwrap();
        QueryBuilder::default().build(&spec).unwrap()
    }

    #[test]
    fn test_request_params_bind_values() {
        let params = client().request_params(&plan());

        assert!(params.contains(&("param_city".to_string(), "Delhi".to_string())));
        assert!(params.contains(&("param_variant".to_string(), "BIKE".to_string())));
        assert!(params.contains(&("join_use_nulls".to_string(), "1".to_string())));
        assert!(params.contains(&(
            "database".to_string(),
            "atlas_driver_offer_bpp".to_string()
        )));
    }

    #[test]
    fn test_request_body_keeps_placeholders() {
        let body = ClickHouseClient::request_body(&plan());
        assert!(body.ends_with("FORMAT JSONCompact"));
        assert!(body.contains("{city:String}"));
        assert!(!body.contains("Delhi"));
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "meta": [
                {"name": "driverId", "type": "String"},
                {"name": "token", "type": "Nullable(String)"}
            ],
            "data": [["d1", "t1"], ["d2", "t2"]],
            "rows": 2,
            "statistics": {"elapsed": 0.01, "rows_read": 10, "bytes_read": 100}
        })
        .to_string();

        let result = parse_response(&body).unwrap();
        assert_eq!(result.columns(), ["driverId", "token"]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows()[1][1], json!("t2"));
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        let err = parse_response("Code: 62. DB::Exception: Syntax error").unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_response_ragged_rows() {
        let body = r#"{"meta":[{"name":"a","type":"String"}],"data":[["x","y"]]}"#;
        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, ExecutionError::MalformedResult(_)));
    }

    /// Serve one canned HTTP response on a local port
    ///
    /// # Returns
    /// * `(ClickHouseClient, JoinHandle<String>)` - Client aimed at the server,
    ///   and a handle yielding the raw request it received
    async fn serve_once(
        status_line: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> (ClickHouseClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut response = format!("HTTP/1.1 {status_line}\r\n");
        for (name, value) in headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ));

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });

        let config = ConnectionConfig {
            url: Some(format!("http://{addr}")),
            ..ConnectionConfig::default()
        };
        let mut client = ClickHouseClient::new(&config).unwrap();
        client.http = reqwest::Client::builder().no_proxy().build().unwrap();

        (client, server)
    }

    /// Read request head and body as announced by Content-Length
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if raw.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).to_string()
    }

    #[tokio::test]
    async fn test_execute_maps_rejection_to_server_error() {
        let (client, server) = serve_once(
            "404 Not Found",
            &[(EXCEPTION_CODE_HEADER, "60")],
            "Code: 60. DB::Exception: Table atlas_driver_offer_bpp.person doesn't exist. (UNKNOWN_TABLE)",
        )
        .await;

        let err = client.execute(&plan()).await.unwrap_err();
        match err {
            ExecutionError::Server { status, info } => {
                assert_eq!(status, 404);
                assert_eq!(info.code(), Some(60));
                assert_eq!(info.name(), Some("UNKNOWN_TABLE"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post "));
        assert!(request.contains("wait_end_of_query=1"));
        assert!(request.contains("param_city=delhi"));
        assert!(request.contains("param_variant=bike"));
        assert!(request.contains("x-clickhouse-user: default"));
        assert!(request.ends_with("format jsoncompact"));
    }

    #[tokio::test]
    async fn test_execute_decodes_rows() {
        let body = json!({
            "meta": [
                {"name": "driverId", "type": "String"},
                {"name": "token", "type": "Nullable(String)"}
            ],
            "data": [["d1", "t1"], ["d2", null]],
            "rows": 2
        })
        .to_string();
        let (client, server) = serve_once("200 OK", &[("Content-Type", "application/json")], &body).await;

        let result = client.execute(&plan()).await.unwrap();
        assert_eq!(result.columns(), ["driverId", "token"]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows()[1][1], json!(null));

        server.await.unwrap();
    }

    #[test]
    fn test_describe_hides_password() {
        let described = client().describe();
        assert!(described.contains("localhost:8123"));
        assert!(!described.contains("secret"));
    }

    #[test]
    fn test_sanitize_endpoint() {
        assert_eq!(
            sanitize_endpoint("https://user:pw@ch.example.com:8443/path@x"),
            "https://***@ch.example.com:8443/path@x"
        );
        assert_eq!(
            sanitize_endpoint("http://localhost:8123"),
            "http://localhost:8123"
        );
    }
}

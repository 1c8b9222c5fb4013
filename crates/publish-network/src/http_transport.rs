//! 수집 서버 HTTP 전송.
//!
//! `MetricTransport` 포트 구현. 라이선스 키 헤더, JSON 헤더, 연결/읽기 타임아웃,
//! TLS 호스트 이름 검증 옵션, 프록시를 적용한다. 재시도는 하지 않는다
//! (미전송 배치는 다음 폴링 주기에 세션이 다시 보낸다).

use async_trait::async_trait;
use publish_core::config::{ProxyConfig, PublishConfig};
use publish_core::error::CoreError;
use publish_core::ports::transport::{MetricTransport, TransportResponse};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::user_agent::user_agent;

/// 연결/읽기 타임아웃 기본값
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(20);

const LICENSE_KEY_HEADER: &str = "X-License-Key";
const APPLICATION_JSON: &str = "application/json";

/// HTTP 클라이언트 옵션
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub timeout: Duration,
    /// false면 인증서의 호스트 이름 불일치를 허용
    pub ssl_host_verification: bool,
    pub proxy: Option<ProxyConfig>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: CONNECTION_TIMEOUT,
            ssl_host_verification: true,
            proxy: None,
        }
    }
}

/// reqwest 기반 전송 — `MetricTransport` 포트 구현
pub struct HttpMetricTransport {
    client: reqwest::Client,
    endpoint: String,
    license_key: String,
}

impl HttpMetricTransport {
    /// 기본 옵션으로 생성
    pub fn new(endpoint: &str, license_key: &str) -> Result<Self, CoreError> {
        Self::with_options(endpoint, license_key, TransportOptions::default())
    }

    /// 검증된 설정으로 생성
    pub fn from_config(config: &PublishConfig) -> Result<Self, CoreError> {
        let options = TransportOptions {
            ssl_host_verification: config.ssl_host_verification,
            proxy: config
                .proxy
                .is_configured()
                .then(|| config.proxy.clone()),
            ..TransportOptions::default()
        };
        Self::with_options(config.endpoint_url(), config.license_key(), options)
    }

    pub fn with_options(
        endpoint: &str,
        license_key: &str,
        options: TransportOptions,
    ) -> Result<Self, CoreError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(options.timeout)
            .read_timeout(options.timeout)
            .user_agent(user_agent());

        if !options.ssl_host_verification {
            warn!("TLS 호스트 이름 검증 비활성화");
            builder = builder.danger_accept_invalid_hostnames(true);
        }

        if let Some(proxy) = options.proxy.as_ref() {
            builder = builder.proxy(build_proxy(proxy)?);
        }

        let client = builder
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            license_key: license_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// 프록시 설정 → reqwest 프록시 (엔드포인트 스킴과 무관하게 모든 요청에 적용)
fn build_proxy(proxy: &ProxyConfig) -> Result<reqwest::Proxy, CoreError> {
    let host = proxy
        .host
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| CoreError::Config("proxy host가 없습니다".to_string()))?;

    let url = match proxy.port_number()? {
        Some(port) => format!("http://{host}:{port}"),
        None => format!("http://{host}"),
    };
    info!("프록시 사용: {url}");

    let mut reqwest_proxy = reqwest::Proxy::all(&url)
        .map_err(|e| CoreError::Config(format!("프록시 설정 실패: {e}")))?;

    if let Some(username) = proxy.username.as_deref() {
        info!("프록시 사용자: {username}");
        if proxy.password.is_some() {
            info!("프록시 비밀번호: [REDACTED]");
        }
        reqwest_proxy = reqwest_proxy.basic_auth(username, proxy.password.as_deref().unwrap_or(""));
    }

    Ok(reqwest_proxy)
}

#[async_trait]
impl MetricTransport for HttpMetricTransport {
    async fn post(&self, body: String) -> Result<TransportResponse, CoreError> {
        debug!("메트릭 서비스 URL: {}", self.endpoint);

        let resp = self
            .client
            .post(&self.endpoint)
            .header(LICENSE_KEY_HEADER, &self.license_key)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(ACCEPT, APPLICATION_JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("메트릭 전송 요청 실패: {e}")))?;

        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("응답 본문 읽기 실패: {e}");
                None
            }
        };
        debug!("응답: {status} {body:?}");

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"agent":{},"components":[]}"#;

    #[test]
    fn creation_with_defaults() {
        let transport = HttpMetricTransport::new("http://localhost:8000/metrics", "key").unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:8000/metrics");
    }

    #[test]
    fn from_config_uses_default_endpoint() {
        let config = PublishConfig {
            license_key: Some("key".to_string()),
            ..PublishConfig::default()
        };
        let transport = HttpMetricTransport::from_config(&config).unwrap();
        assert_eq!(transport.endpoint(), publish_core::config::DEFAULT_ENDPOINT);
    }

    #[test]
    fn proxy_with_credentials() {
        let proxy = ProxyConfig {
            host: Some("proxy.local".to_string()),
            port: Some("3128".to_string()),
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
        };
        assert!(build_proxy(&proxy).is_ok());

        let options = TransportOptions {
            proxy: Some(proxy),
            ssl_host_verification: false,
            ..TransportOptions::default()
        };
        assert!(HttpMetricTransport::with_options("https://example.com", "k", options).is_ok());
    }

    #[test]
    fn proxy_with_bad_port_fails() {
        let proxy = ProxyConfig {
            host: Some("proxy.local".to_string()),
            port: Some("99999".to_string()),
            ..ProxyConfig::default()
        };
        assert!(matches!(build_proxy(&proxy), Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn post_sends_required_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/platform/v1/metrics")
            .match_header("x-license-key", "abc123")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .match_header("user-agent", mockito::Matcher::Regex("^metric-publish/".to_string()))
            .match_body(BODY)
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let url = format!("{}/platform/v1/metrics", server.url());
        let transport = HttpMetricTransport::new(&url, "abc123").unwrap();
        let resp = transport.post(BODY.to_string()).await.unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.body.as_deref(), Some(r#"{"status":"ok"}"#));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/metrics")
            .with_status(503)
            .create_async()
            .await;

        let transport =
            HttpMetricTransport::new(&format!("{}/metrics", server.url()), "k").unwrap();
        let resp = transport.post(BODY.to_string()).await.unwrap();

        assert_eq!(resp.status, 503);
        assert_eq!(resp.body.as_deref(), Some(""));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        // 예약된 포트 0은 연결할 수 없다
        let transport = HttpMetricTransport::new("http://127.0.0.1:0/metrics", "k").unwrap();
        let err = transport.post(BODY.to_string()).await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
    }
}

//! 퍼블리셔 설정 구조체.
//!
//! 라이선스 키, 수집 엔드포인트, 폴링 주기, TLS 호스트 검증, 프록시, 로그 레벨,
//! 에이전트 인스턴스 목록을 정의한다. 파일/환경변수 로드는 `publish-agent`가
//! `config` crate로 수행하고, 여기서는 값 검증만 담당한다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

/// 기본 수집 엔드포인트
pub const DEFAULT_ENDPOINT: &str = "https://platform-api.newrelic.com/platform/v1/metrics";

/// 설정 템플릿에 들어있는 자리표시자 키
const PLACEHOLDER_LICENSE_KEY: &str = "YOUR_LICENSE_KEY_HERE";

/// 최상위 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// 수집 서버 라이선스 키 (필수)
    #[serde(default)]
    pub license_key: Option<String>,
    /// 수집 엔드포인트 재정의 (디버깅용)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// 폴링 주기 (초)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// TLS 호스트 이름 검증
    #[serde(default = "default_true")]
    pub ssl_host_verification: bool,
    /// 프록시 설정
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// 로그 설정
    #[serde(default)]
    pub log: LogConfig,
    /// 에이전트 인스턴스 목록 (비어 있으면 기본 인스턴스 하나)
    #[serde(default)]
    pub agents: Vec<AgentSettings>,
}

/// 프록시 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub host: Option<String>,
    /// 포트 (문자열로 받아 검증)
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// 로그 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// 에이전트 인스턴스 하나의 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// 컴포넌트 표시 이름
    pub name: String,
    /// 컴포넌트 종류 식별자 재정의
    #[serde(default)]
    pub guid: Option<String>,
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            license_key: None,
            endpoint: None,
            poll_interval_secs: default_poll_interval_secs(),
            ssl_host_verification: true,
            proxy: ProxyConfig::default(),
            log: LogConfig::default(),
            agents: Vec::new(),
        }
    }
}

impl PublishConfig {
    /// 시작 전 설정 검증 — 실패하면 스케줄러를 띄우지 않는다
    pub fn validate(&self) -> Result<(), CoreError> {
        let key = self.license_key.as_deref().map(str::trim).unwrap_or("");
        if key.is_empty() {
            return Err(CoreError::Config("license_key is undefined".to_string()));
        }
        if key == PLACEHOLDER_LICENSE_KEY {
            return Err(CoreError::Config(format!(
                "license_key가 템플릿 값 '{PLACEHOLDER_LICENSE_KEY}' 그대로입니다"
            )));
        }

        if self.poll_interval_secs == 0 {
            return Err(CoreError::Validation {
                field: "poll_interval_secs".to_string(),
                message: "0보다 커야 합니다".to_string(),
            });
        }

        let endpoint = url::Url::parse(self.endpoint_url()).map_err(|e| CoreError::Validation {
            field: "endpoint".to_string(),
            message: format!("잘못된 URL: {e}"),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CoreError::Validation {
                field: "endpoint".to_string(),
                message: format!("지원하지 않는 스킴: {}", endpoint.scheme()),
            });
        }

        self.proxy.validate()?;

        if let Some(agent) = self.agents.iter().find(|a| a.name.trim().is_empty()) {
            return Err(CoreError::Validation {
                field: "agents.name".to_string(),
                message: format!("이름이 비어 있습니다: {agent:?}"),
            });
        }

        Ok(())
    }

    /// 라이선스 키 (검증 후 호출)
    pub fn license_key(&self) -> &str {
        self.license_key.as_deref().map(str::trim).unwrap_or("")
    }

    /// 실제 사용할 엔드포인트
    pub fn endpoint_url(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl ProxyConfig {
    pub fn is_configured(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty())
    }

    /// 포트 번호 (검증 후 호출)
    pub fn port_number(&self) -> Result<Option<u16>, CoreError> {
        match self.port.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(port) => port
                .parse::<u16>()
                .map(Some)
                .map_err(|_| CoreError::Config(format!("proxy port가 올바르지 않습니다: '{port}'"))),
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        self.port_number()?;
        if self.port.is_some() && !self.is_configured() {
            return Err(CoreError::Config(
                "proxy port가 설정되었지만 proxy host가 없습니다".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PublishConfig {
        PublishConfig {
            license_key: Some("abc123".to_string()),
            ..PublishConfig::default()
        }
    }

    #[test]
    fn defaults() {
        let config = PublishConfig::default();
        assert_eq!(config.poll_interval_secs, 60);
        assert!(config.ssl_host_verification);
        assert_eq!(config.endpoint_url(), DEFAULT_ENDPOINT);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn missing_key_fails() {
        let err = PublishConfig::default().validate().unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(err.to_string().contains("license_key"));
    }

    #[test]
    fn placeholder_key_fails() {
        let config = PublishConfig {
            license_key: Some(PLACEHOLDER_LICENSE_KEY.to_string()),
            ..PublishConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn zero_interval_fails() {
        let config = PublishConfig {
            poll_interval_secs: 0,
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::Validation { ref field, .. }) if field == "poll_interval_secs"
        ));
    }

    #[test]
    fn bad_endpoint_fails() {
        let config = PublishConfig {
            endpoint: Some("ftp://example.com/metrics".to_string()),
            ..valid()
        };
        assert!(config.validate().is_err());

        let config = PublishConfig {
            endpoint: Some("not a url".to_string()),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_proxy_port_fails() {
        let mut config = valid();
        config.proxy.host = Some("proxy.local".to_string());
        config.proxy.port = Some("eighty".to_string());
        assert!(config.validate().is_err());

        config.proxy.port = Some("8080".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.proxy.port_number().unwrap(), Some(8080));
    }

    #[test]
    fn proxy_port_without_host_fails() {
        let mut config = valid();
        config.proxy.port = Some("8080".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserialize_partial_json() {
        let json = r#"{"license_key":"k","ssl_host_verification":false,"agents":[{"name":"db01"}]}"#;
        let config: PublishConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.poll_interval_secs, 60);
        assert!(!config.ssl_host_verification);
        assert_eq!(config.agents.len(), 1);
        assert!(config.agents[0].guid.is_none());
        assert!(config.validate().is_ok());
    }
}

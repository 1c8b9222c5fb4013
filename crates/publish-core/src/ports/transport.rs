//! 메트릭 전송 포트.
//!
//! 구현: `publish-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;

/// 수집 서버 응답 (상태 코드 + 본문)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// 본문을 읽지 못했으면 `None`
    pub body: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }
}

/// JSON 본문을 수집 엔드포인트로 POST
///
/// 연결/쓰기/읽기 실패는 `CoreError::Network`로 반환한다.
/// HTTP 상태 코드는 에러가 아니며 분류는 세션이 담당한다.
#[async_trait]
pub trait MetricTransport: Send + Sync {
    async fn post(&self, body: String) -> Result<TransportResponse, CoreError>;
}

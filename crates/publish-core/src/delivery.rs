//! 전송 결과 분류.
//!
//! 수집 서버 응답을 우선순위대로 판별한다:
//! 503 → 빈 본문 → 403 + 비활성화 문자열 → 200 + `"status":"ok"` → 나머지 실패.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::ports::transport::TransportResponse;

/// 원격 비활성화 신호 (403 응답 본문과 정확히 일치해야 함)
pub const DISABLE_SENTINEL: &str = "DISABLE_NEW_RELIC";

/// 성공 응답의 status 값
const OK_STATUS: &str = "ok";

/// 한 번의 `deliver()` 결과
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// 보낼 샘플이 없어 네트워크 호출을 하지 않음
    NothingToSend,
    /// 전송 확정
    Delivered { at: DateTime<Utc> },
    /// 503 — 일시적 불가, 배치 유지
    ServiceUnavailable,
    /// 응답 본문 없음/읽기 실패
    EmptyResponse { status: u16 },
    /// 403 + 비활성화 문자열 — 프로세스 종료
    RemoteDisabled,
    /// 그 외 상태 코드 또는 status 필드 불일치
    Rejected { status: u16, body: String },
    /// 연결/쓰기/읽기 실패
    TransportFailed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// 재시도 없이 스케줄링을 멈춰야 하는지
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RemoteDisabled)
    }

    /// 다음 틱에 같은 배치를 다시 보내야 하는지
    pub fn retains_batch(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable
                | Self::EmptyResponse { .. }
                | Self::Rejected { .. }
                | Self::TransportFailed(_)
        )
    }
}

#[derive(Deserialize)]
struct StatusBody {
    status: Option<String>,
}

/// 응답 분류 (성공 시각은 호출자가 전달)
pub fn classify(response: &TransportResponse, now: DateTime<Utc>) -> DeliveryOutcome {
    let status = response.status;

    if status == 503 {
        return DeliveryOutcome::ServiceUnavailable;
    }

    // 줄 단위로 읽은 본문처럼 줄바꿈(\n, \r\n)을 제거한다
    let body: String = match response.body.as_deref() {
        Some(raw) => raw.lines().collect(),
        None => String::new(),
    };
    if body.is_empty() {
        return DeliveryOutcome::EmptyResponse { status };
    }

    if status == 403 && body == DISABLE_SENTINEL {
        return DeliveryOutcome::RemoteDisabled;
    }

    if status == 200 && status_message(&body).as_deref() == Some(OK_STATUS) {
        return DeliveryOutcome::Delivered { at: now };
    }

    DeliveryOutcome::Rejected { status, body }
}

fn status_message(body: &str) -> Option<String> {
    serde_json::from_str::<StatusBody>(body)
        .ok()
        .and_then(|parsed| parsed.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(status: u16, body: Option<&str>) -> TransportResponse {
        TransportResponse {
            status,
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn service_unavailable_wins_over_body() {
        let now = Utc::now();
        assert_eq!(
            classify(&resp(503, None), now),
            DeliveryOutcome::ServiceUnavailable
        );
        assert_eq!(
            classify(&resp(503, Some(r#"{"status":"ok"}"#)), now),
            DeliveryOutcome::ServiceUnavailable
        );
    }

    #[test]
    fn empty_or_unreadable_body() {
        let now = Utc::now();
        assert_eq!(
            classify(&resp(200, Some("")), now),
            DeliveryOutcome::EmptyResponse { status: 200 }
        );
        assert_eq!(
            classify(&resp(200, None), now),
            DeliveryOutcome::EmptyResponse { status: 200 }
        );
    }

    #[test]
    fn line_break_only_body_is_empty() {
        let now = Utc::now();
        for body in ["\n", "\r\n", "\n\n"] {
            assert_eq!(
                classify(&resp(200, Some(body)), now),
                DeliveryOutcome::EmptyResponse { status: 200 },
                "{body:?}"
            );
        }
    }

    #[test]
    fn remote_disable_ignores_line_endings() {
        let now = Utc::now();
        let outcome = classify(&resp(403, Some(DISABLE_SENTINEL)), now);
        assert_eq!(outcome, DeliveryOutcome::RemoteDisabled);
        assert!(outcome.is_fatal());
        assert!(!outcome.retains_batch());

        for body in ["DISABLE_NEW_RELIC\n", "DISABLE_NEW_RELIC\r\n"] {
            assert_eq!(
                classify(&resp(403, Some(body)), now),
                DeliveryOutcome::RemoteDisabled,
                "{body:?}"
            );
        }

        let outcome = classify(&resp(403, Some(" DISABLE_NEW_RELIC")), now);
        assert!(matches!(outcome, DeliveryOutcome::Rejected { status: 403, .. }));

        let outcome = classify(&resp(200, Some(DISABLE_SENTINEL)), now);
        assert!(matches!(outcome, DeliveryOutcome::Rejected { status: 200, .. }));
    }

    #[test]
    fn ok_status_delivers() {
        let now = Utc::now();
        let outcome = classify(&resp(200, Some(r#"{"status":"ok"}"#)), now);
        assert_eq!(outcome, DeliveryOutcome::Delivered { at: now });
        assert!(outcome.is_delivered());

        let outcome = classify(&resp(200, Some("{\"status\":\"ok\"}\r\n")), now);
        assert!(outcome.is_delivered());
    }

    #[test]
    fn other_statuses_are_rejected() {
        let now = Utc::now();
        for (status, body) in [
            (200, r#"{"status":"error"}"#),
            (200, r#"{"result":"ok"}"#),
            (200, "not json"),
            (200, r#"["ok"]"#),
            (201, r#"{"status":"ok"}"#),
            (500, "Internal Server Error"),
            (403, "Forbidden"),
        ] {
            let outcome = classify(&resp(status, Some(body)), now);
            assert!(
                matches!(outcome, DeliveryOutcome::Rejected { .. }),
                "{status} {body} → {outcome:?}"
            );
            assert!(outcome.retains_batch());
        }
    }
}

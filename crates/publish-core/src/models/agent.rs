//! 에이전트 식별 정보 (전송 엔벨로프의 `agent` 항목).

use serde::{Deserialize, Serialize};

/// 호스트 이름, 에이전트 버전, 프로세스 ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub host: String,
    pub version: String,
    pub pid: u32,
}

impl AgentIdentity {
    /// 현재 프로세스 기준 식별 정보 생성 (버전은 첫 엔티티 등록 시 채워진다)
    pub fn for_current_process(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            version: String::new(),
            pid: std::process::id(),
        }
    }
}

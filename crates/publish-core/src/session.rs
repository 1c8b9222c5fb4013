//! 퍼블리싱 세션.
//!
//! 에이전트 식별 정보, 그룹 목록, 현재 배치, 집계 윈도우 시작 시각을 소유한다.
//! 매 틱의 배치 재사용/교체 결정과 전송 결과 반영을 담당한다.
//!
//! 세션 상태는 스케줄러 태스크 하나만 변경하므로 내부 잠금이 없다.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::delivery::{classify, DeliveryOutcome};
use crate::models::agent::AgentIdentity;
use crate::models::batch::{Batch, BatchId};
use crate::models::group::{Group, GroupId};
use crate::ports::transport::MetricTransport;

/// 미전송 데이터가 병합될 수 있는 최대 시간 (분)
pub const AGGREGATION_LIMIT_MINUTES: i64 = 20;

/// 전송 이력이 없는 그룹의 기본 duration (초)
pub const DEFAULT_DURATION_SECS: u64 = 60;

/// 프로세스 수명 동안 유지되는 퍼블리싱 세션
pub struct Session {
    agent: AgentIdentity,
    transport: Arc<dyn MetricTransport>,
    groups: Vec<Group>,
    current: Batch,
    next_batch_id: u64,
    aggregation_started_at: DateTime<Utc>,
    default_duration_secs: u64,
}

impl Session {
    /// 새 세션 생성
    pub fn new(agent: AgentIdentity, transport: Arc<dyn MetricTransport>) -> Self {
        Self {
            agent,
            transport,
            groups: Vec::new(),
            current: Batch::new(BatchId(0)),
            next_batch_id: 1,
            aggregation_started_at: Utc::now(),
            default_duration_secs: DEFAULT_DURATION_SECS,
        }
    }

    /// 전송 이력 없는 그룹의 duration 기본값 설정 (폴링 간격과 맞춘다)
    pub fn with_default_duration_secs(mut self, secs: u64) -> Self {
        self.default_duration_secs = secs;
        self
    }

    pub fn agent(&self) -> &AgentIdentity {
        &self.agent
    }

    /// 에이전트 버전은 처음 한 번만 설정된다
    pub fn set_agent_version_once(&mut self, version: &str) {
        if self.agent.version.is_empty() {
            self.agent.version = version.to_string();
        }
    }

    /// 그룹 생성 (생성 순서가 전송 순서)
    pub fn create_group(&mut self, name: impl Into<String>, guid: impl Into<String>) -> GroupId {
        let id = GroupId(self.groups.len());
        let group = Group::new(id, name.into(), guid.into());
        debug!("그룹 생성: {group}");
        self.groups.push(group);
        id
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    pub fn current_batch(&self) -> &Batch {
        &self.current
    }

    pub fn aggregation_started_at(&self) -> DateTime<Utc> {
        self.aggregation_started_at
    }

    pub(crate) fn set_aggregation_started_at(&mut self, at: DateTime<Utc>) {
        self.aggregation_started_at = at;
    }

    /// 이번 틱에 사용할 배치
    pub fn create_batch(&mut self) -> &mut Batch {
        self.create_batch_at(Utc::now())
    }

    /// 배치 재사용/교체 결정
    ///
    /// 1. 집계 윈도우 초과 → 새 배치 + 모든 그룹의 마지막 전송 시각 초기화
    /// 2. 현재 배치 전송 완료 → 새 배치
    /// 3. 그 외 → 미전송 배치를 그대로 반환 (다음 관측값이 병합됨)
    pub fn create_batch_at(&mut self, now: DateTime<Utc>) -> &mut Batch {
        if self.is_past_aggregation_limit(now) {
            if !self.current.is_empty() && !self.current.is_delivered() {
                warn!(
                    "집계 윈도우 초과 ({AGGREGATION_LIMIT_MINUTES}분): 미전송 샘플 {}개 폐기",
                    self.current.sample_count()
                );
            }
            self.replace_batch();
            for group in &mut self.groups {
                group.set_last_successful_delivery_at(None);
            }
        } else if self.current.is_delivered() {
            self.replace_batch();
        }
        &mut self.current
    }

    fn is_past_aggregation_limit(&self, now: DateTime<Utc>) -> bool {
        now - self.aggregation_started_at > Duration::minutes(AGGREGATION_LIMIT_MINUTES)
    }

    fn replace_batch(&mut self) {
        self.current = Batch::new(BatchId(self.next_batch_id));
        self.next_batch_id += 1;
    }

    /// 현재 배치 전송
    ///
    /// 어떤 실패도 호출자에게 에러로 전파하지 않는다. 실패 시 배치는 그대로 남는다.
    pub async fn deliver(&mut self) -> DeliveryOutcome {
        if self.current.is_empty() {
            debug!("이번 폴링 주기에 보고된 메트릭 없음");
            return DeliveryOutcome::NothingToSend;
        }

        let serialized = {
            let payload = self.current.serialize(
                &self.agent,
                &self.groups,
                Utc::now(),
                self.default_duration_secs,
            );
            serde_json::to_string(&payload)
        };
        let json = match serialized {
            Ok(json) => json,
            Err(e) => {
                error!("메트릭 직렬화 실패: {e}");
                return DeliveryOutcome::TransportFailed(e.to_string());
            }
        };
        debug!("전송 JSON: {json}");

        let outcome = match self.transport.post(json).await {
            Ok(response) => classify(&response, Utc::now()),
            Err(e) => DeliveryOutcome::TransportFailed(e.to_string()),
        };

        self.apply_outcome(&outcome);
        outcome
    }

    fn apply_outcome(&mut self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::NothingToSend => {}
            DeliveryOutcome::Delivered { at } => {
                debug!("전송 성공: 샘플 {}개", self.current.sample_count());
                self.current.mark_delivered();
                self.aggregation_started_at = *at;
                let delivered: Vec<GroupId> = self.current.group_ids().collect();
                for id in delivered {
                    if let Some(group) = self.groups.get_mut(id.0) {
                        group.set_last_successful_delivery_at(Some(*at));
                    }
                }
            }
            DeliveryOutcome::ServiceUnavailable => {
                debug!("수집 서버 일시 불가 (503), 다음 주기에 재시도");
            }
            DeliveryOutcome::EmptyResponse { status } => {
                info!("서버 응답 실패: 응답 본문 없음, 상태 코드 {status}");
            }
            DeliveryOutcome::RemoteDisabled => {
                error!("에이전트가 원격으로 비활성화되었습니다");
            }
            DeliveryOutcome::Rejected { status, body } => {
                error!("서버 응답 실패: {status}, {body}");
            }
            DeliveryOutcome::TransportFailed(reason) => {
                error!("수집 서버 통신 중 에러 발생: {reason}");
            }
        }
    }
}

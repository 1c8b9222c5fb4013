//! 폴링 스케줄러.
//!
//! 고정 간격 타이머 하나로 매 틱마다 배치 준비 → 에이전트별 폴링 → 전송을 수행한다.
//! 틱은 같은 태스크에서 순차 실행되므로 겹치지 않으며, 밀린 틱은 건너뛴다.

use publish_core::delivery::DeliveryOutcome;
use publish_core::error::CoreError;
use publish_core::models::group::GroupId;
use publish_core::ports::entity::{MonitoredEntity, Reporter};
use publish_core::session::Session;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// 스케줄러 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    /// 종료 신호 수신 (정상 종료)
    Shutdown,
    /// 수집 서버가 에이전트를 비활성화함 (비정상 종료)
    RemoteDisabled,
}

struct RegisteredEntity {
    group: GroupId,
    label: String,
    entity: Box<dyn MonitoredEntity>,
}

/// 폴링 스케줄러
pub struct Scheduler {
    session: Session,
    entities: Vec<RegisteredEntity>,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(session: Session, poll_interval: Duration) -> Self {
        Self {
            session,
            entities: Vec::new(),
            poll_interval,
        }
    }

    /// 에이전트 등록: 그룹 생성, 에이전트 버전 설정(최초 1회), 메트릭 초기화
    pub fn register(&mut self, mut entity: Box<dyn MonitoredEntity>) -> Result<GroupId, CoreError> {
        let label = entity.component_label();
        self.session.set_agent_version_once(entity.version());
        entity.setup_metrics()?;
        let group = self.session.create_group(label.clone(), entity.guid());
        info!("에이전트 등록: '{label}' ({})", entity.guid());
        self.entities.push(RegisteredEntity {
            group,
            label,
            entity,
        });
        Ok(group)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// 한 폴링 주기
    ///
    /// 에이전트 에러는 틱을 중단시키며 전송하지 않는다. 수집된 샘플은 미전송
    /// 배치에 남아 다음 틱에 병합된다.
    pub async fn tick(&mut self) -> Result<DeliveryOutcome, CoreError> {
        debug!("메트릭 수집 및 보고");
        let batch = self.session.create_batch();

        for registered in &mut self.entities {
            debug!("폴링 시작: '{}'", registered.label);
            let mut reporter = Reporter::new(&mut *batch, registered.group);
            registered.entity.poll_cycle(&mut reporter).await?;
            debug!("폴링 종료: '{}'", registered.label);
        }

        Ok(self.session.deliver().await)
    }

    /// 종료 신호 또는 원격 비활성화까지 실행
    pub async fn run(&mut self, mut shutdown_rx: watch::Receiver<bool>) -> SchedulerExit {
        info!(
            "스케줄러 시작: 폴링 간격 {}초, 에이전트 {}개",
            self.poll_interval.as_secs(),
            self.entities.len()
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Some(exit) = self.run_tick().await {
                        return exit;
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("스케줄러 종료");
                    return SchedulerExit::Shutdown;
                }
            }
        }
    }

    /// 한 틱만 실행 (`--once`)
    pub async fn run_once(&mut self) -> SchedulerExit {
        self.run_tick().await.unwrap_or(SchedulerExit::Shutdown)
    }

    async fn run_tick(&mut self) -> Option<SchedulerExit> {
        match self.tick().await {
            Ok(outcome) if outcome.is_fatal() => Some(SchedulerExit::RemoteDisabled),
            Ok(_) => None,
            Err(e) => {
                error!("폴링 주기 중 에러 발생: {e}");
                None
            }
        }
    }
}

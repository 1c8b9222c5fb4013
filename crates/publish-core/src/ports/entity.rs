//! 모니터링 대상 포트와 보고 파사드.
//!
//! 엔티티는 매 틱마다 `Reporter`를 받아 자기 그룹의 메트릭을 배치에 기록한다.
//! 배치는 호출마다 명시적으로 전달되며 엔티티에 캐시되지 않는다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::batch::Batch;
use crate::models::group::GroupId;

/// 메트릭 이름 접두사
pub const METRIC_PREFIX: &str = "Component/";

/// 모니터링 대상 (플러그인 에이전트)
#[async_trait]
pub trait MonitoredEntity: Send {
    /// 컴포넌트 종류 식별자 (예: `com.example.mysql`)
    fn guid(&self) -> &str;

    /// 에이전트 버전
    fn version(&self) -> &str;

    /// 대시보드에 표시될 컴포넌트 이름
    fn component_label(&self) -> String;

    /// 첫 틱 이전에 한 번 호출
    fn setup_metrics(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    /// 한 폴링 주기의 메트릭 수집
    async fn poll_cycle(&mut self, reporter: &mut Reporter<'_>) -> Result<(), CoreError>;
}

/// 엔티티 하나에 묶인 배치 쓰기 핸들
pub struct Reporter<'a> {
    batch: &'a mut Batch,
    group: GroupId,
}

impl<'a> Reporter<'a> {
    pub fn new(batch: &'a mut Batch, group: GroupId) -> Self {
        Self { batch, group }
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    /// 단일 관측값 보고. 값이 없으면 조용히 건너뛴다.
    pub fn report_metric(&mut self, name: &str, units: &str, value: Option<f64>) {
        if value.is_some() {
            tracing::debug!("메트릭 보고: {name}");
            self.batch
                .add_metric(self.group, &metric_full_name(name, units), value);
        }
    }

    /// 집계된 관측값 보고
    #[allow(clippy::too_many_arguments)]
    pub fn report_detailed_metric(
        &mut self,
        name: &str,
        units: &str,
        count: u64,
        value: Option<f64>,
        min_value: Option<f64>,
        max_value: Option<f64>,
        sum_of_squares: Option<f64>,
    ) {
        let added = self.batch.add_detailed_metric(
            self.group,
            &metric_full_name(name, units),
            count,
            value,
            min_value,
            max_value,
            sum_of_squares,
        );
        if added {
            tracing::debug!("집계 메트릭 보고: {name}");
        }
    }
}

/// `Component/<name>[<units>]`
pub fn metric_full_name(name: &str, units: &str) -> String {
    format!("{METRIC_PREFIX}{name}[{units}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::batch::BatchId;

    #[test]
    fn full_name_format() {
        assert_eq!(
            metric_full_name("Connections/Active", "connections"),
            "Component/Connections/Active[connections]"
        );
    }

    #[test]
    fn reporter_writes_into_own_group() {
        let mut batch = Batch::new(BatchId(0));
        {
            let mut reporter = Reporter::new(&mut batch, GroupId(3));
            reporter.report_metric("Load", "value", Some(1.5));
            reporter.report_metric("Missing", "value", None);
            reporter.report_detailed_metric(
                "Latency",
                "ms",
                3,
                Some(20.0),
                Some(5.0),
                Some(10.0),
                Some(400.0),
            );
            reporter.report_detailed_metric(
                "Partial",
                "ms",
                3,
                Some(20.0),
                None,
                Some(10.0),
                Some(400.0),
            );
        }
        let samples = batch.samples(GroupId(3));
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].name(), "Component/Load[value]");
        assert_eq!(samples[1].name(), "Component/Latency[ms]");
        assert_eq!(samples[1].count(), 3);
        assert!(batch.samples(GroupId(0)).is_empty());
    }

    struct FixedEntity;

    #[async_trait]
    impl MonitoredEntity for FixedEntity {
        fn guid(&self) -> &str {
            "com.example.fixed"
        }

        fn version(&self) -> &str {
            "0.1.0"
        }

        fn component_label(&self) -> String {
            "fixed".to_string()
        }

        async fn poll_cycle(&mut self, reporter: &mut Reporter<'_>) -> Result<(), CoreError> {
            reporter.report_metric("Requests", "requests/second", Some(12.0));
            Ok(())
        }
    }

    #[test]
    fn entity_default_setup_and_poll() {
        let mut entity = FixedEntity;
        assert!(entity.setup_metrics().is_ok());

        let mut batch = Batch::new(BatchId(0));
        let mut reporter = Reporter::new(&mut batch, GroupId(0));
        tokio_test::block_on(entity.poll_cycle(&mut reporter)).unwrap();

        let samples = batch.samples(GroupId(0));
        assert_eq!(samples[0].name(), "Component/Requests[requests/second]");
        assert_eq!(samples[0].value(), 12.0);
    }
}

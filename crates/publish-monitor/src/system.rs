//! 시스템 리소스 에이전트.
//!
//! `MonitoredEntity` 포트 구현. sysinfo 기반 CPU/메모리/스왑/부하/프로세스/네트워크 수집.

use async_trait::async_trait;
use publish_core::error::CoreError;
use publish_core::ports::entity::{MonitoredEntity, Reporter};
use publish_core::processors::{EpochProcessor, Processor};
use sysinfo::{Networks, ProcessesToUpdate, System};
use tracing::debug;

/// 기본 컴포넌트 종류 식별자
pub const SYSTEM_AGENT_GUID: &str = "com.metricpublish.system";

/// sysinfo 기반 시스템 에이전트 — `MonitoredEntity` 포트 구현
pub struct SystemAgent {
    name: String,
    guid: String,
    sys: System,
    received_rate: EpochProcessor,
    transmitted_rate: EpochProcessor,
}

/// 한 번의 수집 결과
#[derive(Debug, Clone, PartialEq)]
struct SystemSnapshot {
    cpu_usage: f64,
    memory_used: u64,
    memory_total: u64,
    swap_used: u64,
    load: [f64; 3],
    process_count: usize,
    network_received: u64,
    network_transmitted: u64,
}

impl SystemAgent {
    /// 새 시스템 에이전트 생성
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guid: SYSTEM_AGENT_GUID.to_string(),
            sys: System::new(),
            received_rate: EpochProcessor::new(),
            transmitted_rate: EpochProcessor::new(),
        }
    }

    /// 컴포넌트 종류 식별자 재정의
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = guid.into();
        self
    }

    fn collect(&mut self) -> SystemSnapshot {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.sys.refresh_processes(ProcessesToUpdate::All, true);

        // 누적 바이트 합계 (인터페이스 목록을 매번 새로 읽는다)
        let networks = Networks::new_with_refreshed_list();
        let (network_received, network_transmitted) = networks
            .list()
            .values()
            .fold((0u64, 0u64), |(rx, tx), data| {
                (
                    rx.saturating_add(data.total_received()),
                    tx.saturating_add(data.total_transmitted()),
                )
            });

        let load = System::load_average();

        SystemSnapshot {
            cpu_usage: f64::from(self.sys.global_cpu_usage()),
            memory_used: self.sys.used_memory(),
            memory_total: self.sys.total_memory(),
            swap_used: self.sys.used_swap(),
            load: [load.one, load.five, load.fifteen],
            process_count: self.sys.processes().len(),
            network_received,
            network_transmitted,
        }
    }

    fn report(&mut self, snapshot: &SystemSnapshot, reporter: &mut Reporter<'_>) {
        reporter.report_metric("CPU/Usage", "percent", Some(snapshot.cpu_usage));

        reporter.report_metric("Memory/Used", "bytes", Some(snapshot.memory_used as f64));
        reporter.report_metric(
            "Memory/Utilization",
            "percent",
            percent(snapshot.memory_used, snapshot.memory_total),
        );
        reporter.report_metric("Swap/Used", "bytes", Some(snapshot.swap_used as f64));

        for (label, value) in ["1m", "5m", "15m"].iter().zip(snapshot.load) {
            reporter.report_metric(&format!("Load/{label}"), "value", Some(value));
        }

        reporter.report_metric(
            "Processes/Count",
            "processes",
            Some(snapshot.process_count as f64),
        );

        let received = self
            .received_rate
            .process(Some(snapshot.network_received as f64));
        let transmitted = self
            .transmitted_rate
            .process(Some(snapshot.network_transmitted as f64));
        reporter.report_metric("Network/Received", "bytes/second", received);
        reporter.report_metric("Network/Transmitted", "bytes/second", transmitted);
    }
}

fn percent(used: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| used as f64 / total as f64 * 100.0)
}

#[async_trait]
impl MonitoredEntity for SystemAgent {
    fn guid(&self) -> &str {
        &self.guid
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn component_label(&self) -> String {
        self.name.clone()
    }

    /// CPU 사용률은 직전 갱신과의 차이로 계산되므로 첫 틱 전에 기준값을 잡는다
    fn setup_metrics(&mut self) -> Result<(), CoreError> {
        self.collect();
        let snapshot = self.collect();
        self.received_rate
            .process(Some(snapshot.network_received as f64));
        self.transmitted_rate
            .process(Some(snapshot.network_transmitted as f64));
        debug!("시스템 에이전트 초기화: {}", self.name);
        Ok(())
    }

    async fn poll_cycle(&mut self, reporter: &mut Reporter<'_>) -> Result<(), CoreError> {
        let snapshot = self.collect();
        debug!(
            "시스템 메트릭: CPU {:.1}%, 메모리 {}/{}MB, 프로세스 {}",
            snapshot.cpu_usage,
            snapshot.memory_used / 1_048_576,
            snapshot.memory_total / 1_048_576,
            snapshot.process_count
        );
        self.report(&snapshot, reporter);
        Ok(())
    }
}

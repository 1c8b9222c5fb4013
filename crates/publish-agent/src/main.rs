//! # publish-agent
//!
//! 메트릭 퍼블리셔 바이너리 진입점.
//! 설정 로드/검증, 어댑터 와이어링, 스케줄러 실행, 종료 처리.

mod lifecycle;
mod scheduler;
mod settings;

use anyhow::{anyhow, Result};
use clap::Parser;
use publish_core::config::PublishConfig;
use publish_core::models::agent::AgentIdentity;
use publish_core::ports::entity::MonitoredEntity;
use publish_core::session::Session;
use publish_monitor::SystemAgent;
use publish_network::http_transport::HttpMetricTransport;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;
use crate::scheduler::{Scheduler, SchedulerExit};

/// 플러그인 메트릭 퍼블리셔
///
/// 등록된 에이전트를 주기적으로 폴링해 수집 서버로 전송한다
#[derive(Parser, Debug)]
#[command(name = "metric-publish")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 디렉토리 (기본: $PUBLISH_CONFIG_DIR 또는 ./config)
    #[arg(long, short = 'c')]
    config_dir: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error). 설정 파일 값보다 우선
    #[arg(long, short = 'l')]
    log_level: Option<String>,

    /// 폴링 간격 (초)
    #[arg(long)]
    poll_interval: Option<u64>,

    /// 수집 엔드포인트 재정의
    #[arg(long)]
    endpoint: Option<String>,

    /// 한 번만 수집/전송하고 종료
    #[arg(long)]
    once: bool,
}

/// CLI 인자로 설정 오버라이드
fn apply_overrides(config: &mut PublishConfig, args: &Args) {
    if let Some(level) = args.log_level.as_ref() {
        config.log.level = level.clone();
    }
    if let Some(secs) = args.poll_interval {
        config.poll_interval_secs = secs;
    }
    if let Some(endpoint) = args.endpoint.as_ref() {
        config.endpoint = Some(endpoint.clone());
    }
}

fn init_tracing(level: &str) {
    let log_filter = format!(
        "metric_publish={level},publish_core={level},publish_network={level},publish_monitor={level}"
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();
}

fn host_name() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| "localhost".to_string())
}

/// 설정된 에이전트 목록 (없으면 호스트 이름의 기본 시스템 에이전트 하나)
fn build_entities(config: &PublishConfig, host: &str) -> Vec<Box<dyn MonitoredEntity>> {
    if config.agents.is_empty() {
        return vec![Box::new(SystemAgent::new(host))];
    }

    config
        .agents
        .iter()
        .map(|settings| {
            let agent = SystemAgent::new(settings.name.trim());
            let agent = match settings.guid.as_deref() {
                Some(guid) => agent.with_guid(guid),
                None => agent,
            };
            Box::new(agent) as Box<dyn MonitoredEntity>
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 설정 로드
    let config_dir = settings::resolve_config_dir(args.config_dir.as_deref());
    let mut config =
        settings::load(&config_dir).map_err(|e| anyhow!("설정 로드 실패: {e}"))?;
    apply_overrides(&mut config, &args);

    init_tracing(&config.log.level);
    info!("metric-publish {} 시작", env!("CARGO_PKG_VERSION"));
    info!("설정 디렉토리: {}", config_dir.display());

    // 스케줄러 시작 전 검증
    if let Err(e) = config.validate() {
        error!("설정 검증 실패: {e}");
        return Err(anyhow!("설정 검증 실패: {e}"));
    }

    // ── 어댑터 생성 (DI 와이어링) ──
    let transport = Arc::new(HttpMetricTransport::from_config(&config)?);
    info!("수집 엔드포인트: {}", config.endpoint_url());

    let host = host_name();
    let session = Session::new(AgentIdentity::for_current_process(&host), transport)
        .with_default_duration_secs(config.poll_interval_secs);
    let mut scheduler = Scheduler::new(session, config.poll_interval());

    for entity in build_entities(&config, &host) {
        scheduler.register(entity)?;
    }

    let exit = if args.once {
        scheduler.run_once().await
    } else {
        let lifecycle = Arc::new(LifecycleManager::new());
        let _signals = lifecycle.spawn_signal_listener();
        scheduler.run(lifecycle.subscribe()).await
    };

    match exit {
        SchedulerExit::Shutdown => {
            info!("metric-publish 종료");
            Ok(())
        }
        SchedulerExit::RemoteDisabled => {
            error!("수집 서버가 에이전트를 비활성화했습니다. 프로세스를 종료합니다");
            std::process::exit(1);
        }
    }
}

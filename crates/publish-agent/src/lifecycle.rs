//! 라이프사이클 관리.
//!
//! 종료 시그널(SIGINT, SIGTERM)을 watch 채널로 스케줄러에 전달한다.
//! 종료 신호는 다음 틱을 막을 뿐 진행 중인 폴링/전송은 끝까지 수행된다.
//! 원격 비활성화는 이 채널을 거치지 않고 스케줄러가 직접 종료 사유로 반환한다.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호가 이미 발송되었는지
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// 시그널 대기 태스크 시작. 핸들러 등록에 실패하면 에러만 남기고
    /// 스케줄러는 계속 실행된다 (원격 비활성화나 프로세스 종료로만 멈춤).
    pub fn spawn_signal_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let lifecycle = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = lifecycle.wait_for_signal().await {
                error!("시그널 핸들러 등록 실패: {e}");
            }
        })
    }

    /// 종료 신호 발송 (진행 중인 전송은 끝까지 수행된다)
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        let _ = self.shutdown_tx.send(true);
    }

    /// OS 시그널 대기 후 종료 신호 발송
    pub async fn wait_for_signal(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            tokio::select! {
                _ = sigint.recv() => info!("SIGINT 수신"),
                _ = sigterm.recv() => info!("SIGTERM 수신"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            info!("Ctrl+C 수신");
        }

        self.shutdown();
        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

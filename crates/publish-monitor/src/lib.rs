//! # publish-monitor
//!
//! 호스트 시스템 리소스를 수집하는 기본 모니터링 대상.
//! sysinfo로 CPU/메모리/스왑/부하/프로세스 수/네트워크 처리량을 읽어
//! `Reporter`로 보고한다.

pub mod system;

pub use system::SystemAgent;

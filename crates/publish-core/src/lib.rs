//! # publish-core
//!
//! 메트릭 퍼블리셔 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 샘플/그룹/배치 (serde 직렬화)
//! - [`session`] — 배치 재사용 결정과 전송 결과 반영
//! - [`delivery`] — 수집 서버 응답 분류
//! - [`ports`] — 전송/모니터링 대상 포트 (async_trait)
//! - [`processors`] — 카운터 → 변화율 전처리
//! - [`config`] — 설정 구조체와 검증
//! - [`error`] — 핵심 에러 타입 (thiserror)

pub mod config;
pub mod delivery;
pub mod error;
pub mod models;
pub mod ports;
pub mod processors;
pub mod session;

//! 도메인 모델.
//!
//! 샘플 → 그룹 → 배치 순으로 쌓이며, 전송 형식은 serde로 직렬화된다.

pub mod agent;
pub mod batch;
pub mod group;
pub mod sample;

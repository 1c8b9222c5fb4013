//! 값 전처리기.
//!
//! 계속 증가하는 카운터를 초당 변화율로 바꿔 보고할 때 사용한다.

use chrono::{DateTime, Utc};

/// 관측값 변환기
pub trait Processor: Send {
    /// 변환 결과가 없으면 `None` (보고 생략)
    fn process(&mut self, value: Option<f64>) -> Option<f64>;
}

/// 누적 카운터 → 초당 변화율
///
/// 첫 호출, 1초 미만 간격, 음수 변화(카운터 리셋)는 `None`.
#[derive(Debug, Default)]
pub struct EpochProcessor {
    last_value: Option<f64>,
    last_time: Option<DateTime<Utc>>,
}

impl EpochProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지정 시각 기준 변환
    pub fn process_at(&mut self, value: Option<f64>, now: DateTime<Utc>) -> Option<f64> {
        let rate = match (value, self.last_value, self.last_time) {
            (Some(current), Some(last), Some(last_time)) if now > last_time => {
                let elapsed_secs = (now - last_time).num_seconds();
                if elapsed_secs > 0 {
                    Some((current - last) / elapsed_secs as f64).filter(|r| *r >= 0.0)
                } else {
                    None
                }
            }
            _ => None,
        };
        self.last_value = value;
        self.last_time = Some(now);
        rate
    }
}

impl Processor for EpochProcessor {
    fn process(&mut self, value: Option<f64>) -> Option<f64> {
        self.process_at(value, Utc::now())
    }
}

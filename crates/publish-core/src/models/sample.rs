//! 메트릭 샘플 — 이름 하나에 대한 통계 집계값.
//!
//! `value`는 평균이 아닌 누적 합계다. 평균(`value / count`)은 수신 측이 계산한다.

use serde::ser::{Serialize, SerializeTuple, Serializer};

/// 이름 하나에 대한 통계 집계 (count, sum, min, max, sum of squares)
///
/// 병합 대상 판별은 이름 기준이다. 생성/병합 후에는 네 수치 필드가
/// 모두 유한값이고 `min_value <= max_value`를 만족한다.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    name: String,
    count: u64,
    value: f64,
    min_value: f64,
    max_value: f64,
    sum_of_squares: f64,
}

impl Sample {
    /// 단일 관측값으로 샘플 생성
    ///
    /// count=1, min=max=value, sum_of_squares=value². 비유한값은 먼저 정리한다.
    pub fn from_observation(name: impl Into<String>, value: f64) -> Self {
        let value = sanitize(value);
        Self::from_detailed_observation(name, 1, value, value, value, value * value)
    }

    /// 이미 집계된 통계로 샘플 생성
    pub fn from_detailed_observation(
        name: impl Into<String>,
        count: u64,
        value: f64,
        min_value: f64,
        max_value: f64,
        sum_of_squares: f64,
    ) -> Self {
        let mut sample = Self {
            name: name.into(),
            count,
            value,
            min_value,
            max_value,
            sum_of_squares,
        };
        sample.sanitize_values();
        sample
    }

    /// `other`를 이 샘플에 병합
    pub fn merge(&mut self, other: &Sample) {
        self.count = self.count.saturating_add(other.count);
        self.value += other.value;
        self.min_value = self.min_value.min(other.min_value);
        self.max_value = self.max_value.max(other.max_value);
        self.sum_of_squares += other.sum_of_squares;
        self.sanitize_values();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.sum_of_squares
    }

    fn sanitize_values(&mut self) {
        self.value = sanitize(self.value);
        self.min_value = sanitize(self.min_value);
        self.max_value = sanitize(self.max_value);
        self.sum_of_squares = sanitize(self.sum_of_squares);
        if self.min_value > self.max_value {
            std::mem::swap(&mut self.min_value, &mut self.max_value);
        }
    }
}

/// 비유한값 정리: +∞ → 최대 유한값, −∞ → 최소(가장 작은 음수) 유한값, NaN → 0
fn sanitize(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else if v == f64::INFINITY {
        f64::MAX
    } else if v == f64::NEG_INFINITY {
        f64::MIN
    } else {
        v
    }
}

/// 전송 형식: `[value, count, min, max, sum_of_squares]`
impl Serialize for Sample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(5)?;
        tuple.serialize_element(&self.value)?;
        tuple.serialize_element(&self.count)?;
        tuple.serialize_element(&self.min_value)?;
        tuple.serialize_element(&self.max_value)?;
        tuple.serialize_element(&self.sum_of_squares)?;
        tuple.end()
    }
}

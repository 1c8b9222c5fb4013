//! 컴포넌트 그룹 — 모니터링 대상 하나의 식별자와 마지막 전송 시각.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::sample::Sample;

/// 세션이 발급하는 그룹 핸들 (생성 순서대로 증가)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub(crate) usize);

/// 모니터링 대상 하나 — 프로세스 수명 동안 한 번 생성된다
#[derive(Debug, Clone)]
pub struct Group {
    id: GroupId,
    name: String,
    guid: String,
    last_successful_delivery_at: Option<DateTime<Utc>>,
}

/// 전송용 컴포넌트 항목
#[derive(Debug, Serialize)]
pub struct ComponentPayload<'a> {
    pub name: &'a str,
    pub guid: &'a str,
    pub duration: u64,
    #[serde(serialize_with = "serialize_metrics")]
    pub metrics: &'a [Sample],
}

impl Group {
    pub(crate) fn new(id: GroupId, name: String, guid: String) -> Self {
        Self {
            id,
            name,
            guid,
            last_successful_delivery_at: None,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn last_successful_delivery_at(&self) -> Option<DateTime<Utc>> {
        self.last_successful_delivery_at
    }

    pub(crate) fn set_last_successful_delivery_at(&mut self, at: Option<DateTime<Utc>>) {
        self.last_successful_delivery_at = at;
    }

    /// 마지막 성공 전송 이후 경과 시간 (초, 올림)
    ///
    /// 전송 이력이 없으면 `default_secs`를 반환한다.
    pub fn duration_secs(&self, now: DateTime<Utc>, default_secs: u64) -> u64 {
        let Some(last) = self.last_successful_delivery_at else {
            return default_secs;
        };
        let elapsed_ms = (now - last).num_milliseconds().max(0) as u64;
        elapsed_ms.div_ceil(1000)
    }

    /// 배치 내 이 그룹의 샘플로 전송 항목 생성. 샘플이 없으면 `None`.
    pub fn serialize_into<'a>(
        &'a self,
        samples: &'a [Sample],
        now: DateTime<Utc>,
        default_duration_secs: u64,
    ) -> Option<ComponentPayload<'a>> {
        if samples.is_empty() {
            return None;
        }
        Some(ComponentPayload {
            name: &self.name,
            guid: &self.guid,
            duration: self.duration_secs(now, default_duration_secs),
            metrics: samples,
        })
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Group({}:{})", self.name, self.guid)
    }
}

/// 샘플 목록을 최초 등장 순서 그대로 `{name: [..]}` 맵으로 직렬화
fn serialize_metrics<S>(samples: &&[Sample], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(samples.len()))?;
    for sample in samples.iter() {
        map.serialize_entry(sample.name(), sample)?;
    }
    map.end()
}

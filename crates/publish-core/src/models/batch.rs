//! 전송 배치 — 그룹별 샘플 목록.
//!
//! 전송 실패 시 세션이 같은 배치를 다음 틱에 다시 넘겨주므로,
//! 새 관측값은 아직 전송되지 않은 샘플에 병합된다.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::agent::AgentIdentity;
use super::group::{ComponentPayload, Group, GroupId};
use super::sample::Sample;

/// 배치 식별자 — 세션 안에서 배치 인스턴스를 구분한다
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(pub(crate) u64);

/// 전송 단위
#[derive(Debug)]
pub struct Batch {
    id: BatchId,
    /// 그룹 핸들 → 샘플 목록 (샘플은 최초 등장 순서 유지)
    metrics: BTreeMap<GroupId, Vec<Sample>>,
    delivered: bool,
}

/// 전송 본문 (JSON 엔벨로프)
#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    pub agent: &'a AgentIdentity,
    pub components: Vec<ComponentPayload<'a>>,
}

impl Batch {
    pub(crate) fn new(id: BatchId) -> Self {
        Self {
            id,
            metrics: BTreeMap::new(),
            delivered: false,
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    pub(crate) fn mark_delivered(&mut self) {
        self.delivered = true;
    }

    /// 단일 관측값 추가. 값이 없으면 아무것도 하지 않는다.
    pub fn add_metric(&mut self, group: GroupId, name: &str, value: Option<f64>) -> bool {
        match value {
            Some(value) => {
                self.add_sample(group, Sample::from_observation(name, value));
                true
            }
            None => false,
        }
    }

    /// 집계된 관측값 추가. 수치 인자 중 하나라도 없거나 `count`가 0이면 아무것도 하지 않는다.
    #[allow(clippy::too_many_arguments)]
    pub fn add_detailed_metric(
        &mut self,
        group: GroupId,
        name: &str,
        count: u64,
        value: Option<f64>,
        min_value: Option<f64>,
        max_value: Option<f64>,
        sum_of_squares: Option<f64>,
    ) -> bool {
        let (Some(value), Some(min_value), Some(max_value), Some(sum_of_squares)) =
            (value, min_value, max_value, sum_of_squares)
        else {
            return false;
        };
        if count == 0 {
            return false;
        }
        self.add_sample(
            group,
            Sample::from_detailed_observation(
                name,
                count,
                value,
                min_value,
                max_value,
                sum_of_squares,
            ),
        );
        true
    }

    /// 같은 이름의 샘플이 있으면 병합, 없으면 뒤에 추가
    pub fn add_sample(&mut self, group: GroupId, sample: Sample) {
        debug!("{group:?} : {sample:?}");
        let samples = self.metrics.entry(group).or_default();
        match samples.iter_mut().find(|s| s.name() == sample.name()) {
            Some(existing) => existing.merge(&sample),
            None => samples.push(sample),
        }
    }

    /// 그룹의 샘플 목록 (없으면 빈 슬라이스)
    pub fn samples(&self, group: GroupId) -> &[Sample] {
        self.metrics.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 전체 샘플 수
    pub fn sample_count(&self) -> usize {
        self.metrics.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0
    }

    /// 샘플이 하나 이상 있는 그룹 핸들
    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.metrics
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(id, _)| *id)
    }

    /// 전송 본문 생성. 그룹 생성 순서를 따르며 샘플 없는 그룹은 생략한다.
    pub fn serialize<'a>(
        &'a self,
        agent: &'a AgentIdentity,
        groups: &'a [Group],
        now: DateTime<Utc>,
        default_duration_secs: u64,
    ) -> Payload<'a> {
        let components = groups
            .iter()
            .filter_map(|g| g.serialize_into(self.samples(g.id()), now, default_duration_secs))
            .collect();
        Payload { agent, components }
    }
}

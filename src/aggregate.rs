use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::classify::risk_category;
use crate::model::{DeiCategory, DistrictRecord, Metric, RiskCategory};

/// Aggregating zero records is a caller bug, not an all-healthy group. Fail
/// loudly instead of letting NaN means leak into rendered output.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot aggregate an empty district group")]
pub struct EmptyGroup;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ScoreSummary {
    pub mean_dei: f64,
    pub mean_ahs: f64,
    pub mean_ubs: f64,
    pub mean_srs: f64,
}

impl ScoreSummary {
    pub fn mean(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Dei => self.mean_dei,
            Metric::Ahs => self.mean_ahs,
            Metric::Ubs => self.mean_ubs,
            Metric::Srs => self.mean_srs,
        }
    }
}

pub fn state_summary(records: &[DistrictRecord]) -> Result<ScoreSummary, EmptyGroup> {
    if records.is_empty() {
        return Err(EmptyGroup);
    }
    let count = records.len() as f64;
    let mut sums = [0.0f64; 4];
    for record in records {
        for (slot, metric) in sums.iter_mut().zip(Metric::ALL) {
            *slot += record.score(metric);
        }
    }
    Ok(ScoreSummary {
        mean_dei: sums[0] / count,
        mean_ahs: sums[1] / count,
        mean_ubs: sums[2] / count,
        mean_srs: sums[3] / count,
    })
}

/// Histogram over [`risk_category`]. Every category is present so the
/// dashboard can always render all four rows.
pub fn risk_counts(records: &[DistrictRecord]) -> BTreeMap<RiskCategory, usize> {
    let mut counts = BTreeMap::new();
    for category in RiskCategory::ALL {
        counts.insert(category, 0usize);
    }
    for record in records {
        *counts.entry(risk_category(record)).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Extremes {
    pub best: DistrictRecord,
    pub worst: DistrictRecord,
}

/// Best and worst district by DEI. Ties keep the first-encountered record so
/// output stays stable across runs.
pub fn rank_extremes(records: &[DistrictRecord]) -> Result<Extremes, EmptyGroup> {
    let mut iter = records.iter();
    let first = iter.next().ok_or(EmptyGroup)?;
    let mut best = first;
    let mut worst = first;
    for record in iter {
        if record.dei > best.dei {
            best = record;
        }
        if record.dei < worst.dei {
            worst = record;
        }
    }
    Ok(Extremes {
        best: best.clone(),
        worst: worst.clone(),
    })
}

pub fn dei_category(mean_dei: f64) -> DeiCategory {
    if mean_dei >= 0.7 {
        DeiCategory::Good
    } else if mean_dei >= 0.5 {
        DeiCategory::Warning
    } else {
        DeiCategory::Critical
    }
}

/// Ordered insight lines for a state: per-threshold failure counts, the
/// overall performance statement, then best and worst performer.
pub fn state_insights(records: &[DistrictRecord]) -> Result<Vec<String>, EmptyGroup> {
    let summary = state_summary(records)?;
    let extremes = rank_extremes(records)?;

    let low_dei = records.iter().filter(|r| r.dei < 0.5).count();
    let access_stress = records.iter().filter(|r| r.ahs < 0.5).count();
    let update_burden = records.iter().filter(|r| r.ubs > 0.7).count();
    let stability_risk = records.iter().filter(|r| r.srs > 0.6).count();

    let mut insights = Vec::new();
    if low_dei > 0 {
        insights.push(format!(
            "{low_dei} district(s) have critically low DEI scores and need immediate attention"
        ));
    }
    if access_stress > 0 {
        insights.push(format!(
            "{access_stress} district(s) face access stress - consider expanding enrollment infrastructure"
        ));
    }
    if update_burden > 0 {
        insights.push(format!(
            "{update_burden} district(s) have high update burden - deploy dedicated update camps"
        ));
    }
    if stability_risk > 0 {
        insights.push(format!(
            "{stability_risk} district(s) show stability risks - audit system uptime and connectivity"
        ));
    }

    insights.push(
        if summary.mean_dei >= 0.7 {
            "Overall state performance is excellent - focus on maintaining standards"
        } else if summary.mean_dei >= 0.5 {
            "Overall state performance is moderate - targeted improvements can yield significant gains"
        } else {
            "State-wide performance is below par - comprehensive intervention strategy needed"
        }
        .to_string(),
    );

    insights.push(format!(
        "Best performer: {} (DEI: {:.3})",
        extremes.best.display_name(),
        extremes.best.dei
    ));
    insights.push(format!(
        "Needs most attention: {} (DEI: {:.3})",
        extremes.worst.display_name(),
        extremes.worst.dei
    ));

    Ok(insights)
}

pub fn group_by_state(records: &[DistrictRecord]) -> BTreeMap<String, Vec<DistrictRecord>> {
    let mut groups: BTreeMap<String, Vec<DistrictRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.state.clone())
            .or_default()
            .push(record.clone());
    }
    groups
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StateRollup {
    pub state: String,
    pub districts: usize,
    pub means: ScoreSummary,
    pub category: DeiCategory,
}

/// Per-state rollups ranked by mean DEI, best state first.
pub fn state_rollups(records: &[DistrictRecord]) -> Result<Vec<StateRollup>, EmptyGroup> {
    if records.is_empty() {
        return Err(EmptyGroup);
    }
    let mut rollups = Vec::new();
    for (state, group) in group_by_state(records) {
        let means = state_summary(&group)?;
        rollups.push(StateRollup {
            state,
            districts: group.len(),
            category: dei_category(means.mean_dei),
            means,
        });
    }
    rollups.sort_by(|a, b| {
        b.means
            .mean_dei
            .partial_cmp(&a.means.mean_dei)
            .unwrap_or(Ordering::Equal)
    });
    Ok(rollups)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NationalSummary {
    pub districts: usize,
    pub states: usize,
    pub means: ScoreSummary,
    pub category: DeiCategory,
    pub top_states_mean_dei: f64,
    pub bottom_states_mean_dei: f64,
}

/// National rollup: overall means plus the average mean DEI of the top and
/// bottom three states.
pub fn national_summary(records: &[DistrictRecord]) -> Result<NationalSummary, EmptyGroup> {
    let means = state_summary(records)?;
    let rollups = state_rollups(records)?;

    let band = rollups.len().min(3);
    let top: f64 = rollups[..band]
        .iter()
        .map(|r| r.means.mean_dei)
        .sum::<f64>()
        / band as f64;
    let bottom: f64 = rollups[rollups.len() - band..]
        .iter()
        .map(|r| r.means.mean_dei)
        .sum::<f64>()
        / band as f64;

    Ok(NationalSummary {
        districts: records.len(),
        states: rollups.len(),
        category: dei_category(means.mean_dei),
        means,
        top_states_mean_dei: top,
        bottom_states_mean_dei: bottom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, district: &str, dei: f64) -> DistrictRecord {
        DistrictRecord {
            state: state.to_string(),
            district: district.to_string(),
            dei,
            ahs: 0.8,
            ubs: 0.2,
            srs: 0.2,
        }
    }

    #[test]
    fn summary_means() {
        let records = vec![record("X", "a", 0.2), record("X", "b", 0.8)];
        let summary = state_summary(&records).expect("non-empty group");
        assert!((summary.mean_dei - 0.5).abs() < 1e-12);
        assert!((summary.mean_ahs - 0.8).abs() < 1e-12);
    }

    #[test]
    fn empty_group_is_an_error() {
        assert_eq!(state_summary(&[]).unwrap_err(), EmptyGroup);
        assert_eq!(rank_extremes(&[]).unwrap_err(), EmptyGroup);
        assert_eq!(state_insights(&[]).unwrap_err(), EmptyGroup);
        assert_eq!(national_summary(&[]).unwrap_err(), EmptyGroup);
    }

    #[test]
    fn extremes_tie_break_is_first_encountered() {
        let records = vec![record("X", "a", 0.9), record("X", "b", 0.9)];
        let extremes = rank_extremes(&records).expect("non-empty group");
        assert_eq!(extremes.best.district, "a");
        assert_eq!(extremes.worst.district, "a");
    }

    #[test]
    fn risk_counts_lists_every_category() {
        let mut bad = record("X", "stressed", 0.9);
        bad.ahs = 0.3;
        let records = vec![record("X", "fine", 0.9), bad];
        let counts = risk_counts(&records);
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[&RiskCategory::Healthy], 1);
        assert_eq!(counts[&RiskCategory::AccessStress], 1);
        assert_eq!(counts[&RiskCategory::UpdateBurden], 0);
        assert_eq!(counts[&RiskCategory::StabilityRisk], 0);
    }

    #[test]
    fn dei_category_breakpoints() {
        assert_eq!(dei_category(0.7), DeiCategory::Good);
        assert_eq!(dei_category(0.69), DeiCategory::Warning);
        assert_eq!(dei_category(0.5), DeiCategory::Warning);
        assert_eq!(dei_category(0.49), DeiCategory::Critical);
    }

    #[test]
    fn insights_come_in_fixed_order() {
        let mut low = record("X", "struggling", 0.4);
        low.ahs = 0.4;
        let records = vec![record("X", "star", 0.9), low];
        let insights = state_insights(&records).expect("non-empty group");

        assert!(insights[0].starts_with("1 district(s) have critically low DEI"));
        assert!(insights[1].starts_with("1 district(s) face access stress"));
        // mean DEI 0.65 -> moderate
        assert!(insights[2].contains("moderate"));
        assert!(insights[3].starts_with("Best performer: Star"));
        assert!(insights[4].starts_with("Needs most attention: Struggling"));
    }

    #[test]
    fn healthy_state_skips_zero_count_lines() {
        let records = vec![record("X", "a", 0.9), record("X", "b", 0.8)];
        let insights = state_insights(&records).expect("non-empty group");
        assert_eq!(insights.len(), 3);
        assert!(insights[0].contains("excellent"));
    }

    #[test]
    fn rollups_rank_states_by_mean_dei() {
        let records = vec![
            record("Alpha", "a", 0.4),
            record("Beta", "b", 0.9),
            record("Gamma", "c", 0.6),
        ];
        let rollups = state_rollups(&records).expect("non-empty dataset");
        let order: Vec<&str> = rollups.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(order, vec!["Beta", "Gamma", "Alpha"]);
        assert_eq!(rollups[0].category, DeiCategory::Good);
        assert_eq!(rollups[2].category, DeiCategory::Critical);
    }

    #[test]
    fn national_summary_top_and_bottom_bands() {
        let records = vec![
            record("Alpha", "a", 0.4),
            record("Beta", "b", 0.9),
            record("Gamma", "c", 0.6),
            record("Delta", "d", 0.8),
        ];
        let national = national_summary(&records).expect("non-empty dataset");
        assert_eq!(national.states, 4);
        assert_eq!(national.districts, 4);
        // ranking: Beta 0.9, Delta 0.8, Gamma 0.6, Alpha 0.4
        assert!((national.top_states_mean_dei - (0.9 + 0.8 + 0.6) / 3.0).abs() < 1e-12);
        assert!((national.bottom_states_mean_dei - (0.8 + 0.6 + 0.4) / 3.0).abs() < 1e-12);
    }
}

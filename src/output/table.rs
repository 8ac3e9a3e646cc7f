use std::collections::BTreeMap;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::aggregate::{NationalSummary, ScoreSummary, StateRollup};
use crate::classify::{intervention, metric_badge, risk_category};
use crate::model::{BadgeLabel, DeiCategory, Direction, DistrictRecord, Metric, RiskCategory};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

// Heatmap tinting for score cells, matching the dashboard ranking table.
fn score_cell(score: f64, direction: Direction) -> Cell {
    let color = match direction {
        Direction::HigherIsBetter => {
            if score >= 0.7 {
                Color::Green
            } else if score >= 0.4 {
                Color::Yellow
            } else {
                Color::Red
            }
        }
        Direction::LowerIsBetter => {
            if score <= 0.4 {
                Color::Green
            } else if score <= 0.7 {
                Color::Yellow
            } else {
                Color::Red
            }
        }
    };
    Cell::new(format!("{score:.3}")).fg(color)
}

fn badge_cell(label: BadgeLabel) -> Cell {
    let color = match label {
        BadgeLabel::Excellent | BadgeLabel::Good => Color::Green,
        BadgeLabel::NeedsAttention => Color::Yellow,
        BadgeLabel::Critical => Color::Red,
    };
    Cell::new(label.to_string()).fg(color)
}

fn category_cell(category: DeiCategory) -> Cell {
    let color = match category {
        DeiCategory::Good => Color::Green,
        DeiCategory::Warning => Color::Yellow,
        DeiCategory::Critical => Color::Red,
    };
    Cell::new(category.to_string()).fg(color)
}

pub fn render_summary_table(summary: &ScoreSummary, counts: &BTreeMap<RiskCategory, usize>) -> String {
    let mut table = base_table();
    table.set_header(vec!["Metric", "State Mean", "Badge"]);
    for metric in Metric::ALL {
        let mean = summary.mean(metric);
        let badge = crate::classify::badge(mean, metric.direction());
        table.add_row(Row::from(vec![
            Cell::new(metric.full_name()),
            score_cell(mean, metric.direction()),
            badge_cell(badge.label),
        ]));
    }

    let mut risk = base_table();
    risk.set_header(vec!["Risk Category", "Districts"]);
    for category in RiskCategory::ALL {
        let count = counts.get(&category).copied().unwrap_or(0);
        let cell = if category == RiskCategory::Healthy {
            Cell::new(count.to_string()).fg(Color::Green)
        } else if count > 0 {
            Cell::new(count.to_string()).fg(Color::Yellow)
        } else {
            Cell::new(count.to_string())
        };
        risk.add_row(Row::from(vec![Cell::new(category.to_string()), cell]));
    }

    format!("{table}\n{risk}")
}

/// District ranking table, best DEI first.
pub fn render_districts_table(records: &[DistrictRecord]) -> String {
    let mut sorted: Vec<&DistrictRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.dei.partial_cmp(&a.dei).unwrap_or(std::cmp::Ordering::Equal));

    let mut table = base_table();
    table.set_header(vec![
        "District",
        "DEI",
        "Access",
        "Update Load",
        "Stability",
        "Status",
    ]);
    for record in sorted {
        table.add_row(Row::from(vec![
            Cell::new(record.display_name()),
            score_cell(record.dei, Direction::HigherIsBetter),
            score_cell(record.ahs, Direction::HigherIsBetter),
            score_cell(record.ubs, Direction::LowerIsBetter),
            score_cell(record.srs, Direction::LowerIsBetter),
            Cell::new(risk_category(record).to_string()),
        ]));
    }
    table.to_string()
}

pub fn render_detail_table(record: &DistrictRecord, summary: &ScoreSummary) -> String {
    let mut table = base_table();
    table.set_header(vec!["Metric", "Score", "State Avg", "Difference", "Badge"]);
    for metric in Metric::ALL {
        let score = record.score(metric);
        let avg = summary.mean(metric);
        table.add_row(Row::from(vec![
            Cell::new(metric.full_name()),
            score_cell(score, metric.direction()),
            Cell::new(format!("{avg:.3}")),
            Cell::new(format!("{:+.3}", score - avg)),
            badge_cell(metric_badge(record, metric).label),
        ]));
    }
    table.to_string()
}

/// Intervention mapping, most critical district first.
pub fn render_interventions_table(records: &[DistrictRecord]) -> String {
    let mut sorted: Vec<&DistrictRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.dei.partial_cmp(&b.dei).unwrap_or(std::cmp::Ordering::Equal));

    let mut table = base_table();
    table.set_header(vec!["District", "DEI", "Dominant Risk", "Suggested Action"]);
    for record in sorted {
        let plan = intervention(record);
        table.add_row(Row::from(vec![
            Cell::new(record.display_name()),
            score_cell(record.dei, Direction::HigherIsBetter),
            Cell::new(plan.dominant_risk),
            Cell::new(plan.action),
        ]));
    }
    table.to_string()
}

pub fn render_rollup_table(rollups: &[StateRollup]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        "Rank",
        "State",
        "Districts",
        "Mean DEI",
        "Mean Access",
        "Mean Update Load",
        "Mean Stability",
        "Category",
    ]);
    for (idx, rollup) in rollups.iter().enumerate() {
        table.add_row(Row::from(vec![
            Cell::new((idx + 1).to_string()),
            Cell::new(rollup.state.clone()),
            Cell::new(rollup.districts.to_string()),
            score_cell(rollup.means.mean_dei, Direction::HigherIsBetter),
            score_cell(rollup.means.mean_ahs, Direction::HigherIsBetter),
            score_cell(rollup.means.mean_ubs, Direction::LowerIsBetter),
            score_cell(rollup.means.mean_srs, Direction::LowerIsBetter),
            category_cell(rollup.category),
        ]));
    }
    table.to_string()
}

pub fn render_national_table(national: &NationalSummary) -> String {
    let mut table = base_table();
    table.set_header(vec!["", "Value"]);
    table.add_row(Row::from(vec![
        Cell::new("Districts"),
        Cell::new(national.districts.to_string()),
    ]));
    table.add_row(Row::from(vec![
        Cell::new("States/UTs"),
        Cell::new(national.states.to_string()),
    ]));
    table.add_row(Row::from(vec![
        Cell::new("National mean DEI"),
        score_cell(national.means.mean_dei, Direction::HigherIsBetter),
    ]));
    table.add_row(Row::from(vec![
        Cell::new("Category"),
        category_cell(national.category),
    ]));
    table.add_row(Row::from(vec![
        Cell::new("Top 3 states mean DEI"),
        Cell::new(format!("{:.3}", national.top_states_mean_dei)),
    ]));
    table.add_row(Row::from(vec![
        Cell::new("Bottom 3 states mean DEI"),
        Cell::new(format!("{:.3}", national.bottom_states_mean_dei)),
    ]));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(district: &str, dei: f64) -> DistrictRecord {
        DistrictRecord {
            state: "X".to_string(),
            district: district.to_string(),
            dei,
            ahs: 0.8,
            ubs: 0.2,
            srs: 0.2,
        }
    }

    #[test]
    fn districts_table_ranks_by_dei_descending() {
        let records = vec![record("low", 0.4), record("high", 0.9)];
        let rendered = render_districts_table(&records);
        let high = rendered.find("High").expect("high row");
        let low = rendered.find("Low").expect("low row");
        assert!(high < low);
    }

    #[test]
    fn interventions_table_puts_critical_first() {
        let records = vec![record("fine", 0.9), record("crisis", 0.4)];
        let rendered = render_interventions_table(&records);
        let crisis = rendered.find("Crisis").expect("crisis row");
        let fine = rendered.find("Fine").expect("fine row");
        assert!(crisis < fine);
    }
}

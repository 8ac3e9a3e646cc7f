use chrono::{DateTime, Utc};

use crate::aggregate::ScoreSummary;
use crate::classify::{detailed_suggestion, issue_type, metric_badge, recommendation};
use crate::model::{DistrictRecord, Metric};

const RULE_HEAVY: &str =
    "================================================================================";
const RULE_LIGHT: &str =
    "--------------------------------------------------------------------------------";

fn centered(title: &str) -> String {
    format!("{title:^80}").trim_end().to_string()
}

/// Downloadable plain-text report for one district. Pure function of the
/// record, its state means, and a caller-supplied timestamp.
pub fn generate_district_report(
    record: &DistrictRecord,
    state_means: &ScoreSummary,
    generated_at: DateTime<Utc>,
) -> String {
    let rec = recommendation(record);
    let issue = issue_type(record);

    let mut out = String::new();
    out.push_str(RULE_HEAVY);
    out.push('\n');
    out.push_str(&centered("EQUITY NEXUS - DISTRICT REPORT"));
    out.push('\n');
    out.push_str(RULE_HEAVY);
    out.push_str("\n\n");

    out.push_str(&format!("STATE: {}\n", record.state));
    out.push_str(&format!("DISTRICT: {}\n", record.display_name()));
    out.push_str(&format!(
        "REPORT DATE: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M")
    ));

    out.push_str(RULE_LIGHT);
    out.push('\n');
    out.push_str(&centered("PERFORMANCE SCORES"));
    out.push('\n');
    out.push_str(RULE_LIGHT);
    out.push_str("\n\n");

    out.push_str("  METRIC                    SCORE      STATE AVG    DIFFERENCE    STATUS\n");
    out.push_str("  -------------------------------------------------------------------------\n");
    for metric in Metric::ALL {
        let score = record.score(metric);
        let avg = state_means.mean(metric);
        out.push_str(&format!(
            "  {:<26}{:.3}      {:.3}        {:+.3}        {}\n",
            metric.full_name(),
            score,
            avg,
            score - avg,
            metric_badge(record, metric).label
        ));
    }
    out.push('\n');

    out.push_str(RULE_LIGHT);
    out.push('\n');
    out.push_str(&centered("ASSESSMENT"));
    out.push('\n');
    out.push_str(RULE_LIGHT);
    out.push_str("\n\n");
    out.push_str(&format!("STATUS: {}\n\n", rec.title));
    out.push_str(&format!("SUMMARY:\n{}\n\n", rec.message));
    out.push_str(&format!("RECOMMENDED ACTION:\n{}\n\n", rec.action));

    out.push_str(RULE_LIGHT);
    out.push('\n');
    out.push_str(&centered("DETAILED RECOMMENDATIONS"));
    out.push('\n');
    out.push_str(RULE_LIGHT);
    out.push_str("\n\n");
    out.push_str(detailed_suggestion(issue));
    out.push_str("\n\n");

    out.push_str(RULE_LIGHT);
    out.push('\n');
    out.push_str(&centered("METRIC DEFINITIONS"));
    out.push('\n');
    out.push_str(RULE_LIGHT);
    out.push_str("\n\n");
    for metric in Metric::ALL {
        out.push_str(&format!("* {}: {}\n\n", metric.full_name(), metric.tooltip()));
    }

    out.push_str(RULE_HEAVY);
    out.push('\n');
    out.push_str(&centered("END OF REPORT"));
    out.push('\n');
    out.push_str(RULE_HEAVY);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> (DistrictRecord, ScoreSummary) {
        let record = DistrictRecord {
            state: "Andhra Pradesh".to_string(),
            district: "guntur".to_string(),
            dei: 0.82,
            ahs: 0.9,
            ubs: 0.3,
            srs: 0.2,
        };
        let means = ScoreSummary {
            mean_dei: 0.745,
            mean_ahs: 0.8,
            mean_ubs: 0.4,
            mean_srs: 0.35,
        };
        (record, means)
    }

    #[test]
    fn report_rows_follow_fixed_metric_order() {
        let (record, means) = sample();
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).single().expect("timestamp");
        let report = generate_district_report(&record, &means, when);

        let dei = report.find("Digital Equity Index").expect("dei row");
        let access = report.find("Access Health Score").expect("access row");
        let update = report.find("Update Load Score").expect("update row");
        let stability = report.find("Stability Score").expect("stability row");
        assert!(dei < access && access < update && update < stability);
    }

    #[test]
    fn report_carries_signed_differences_and_badges() {
        let (record, means) = sample();
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).single().expect("timestamp");
        let report = generate_district_report(&record, &means, when);

        assert!(report.contains("REPORT DATE: 2025-06-01 09:30"));
        assert!(report.contains("DISTRICT: Guntur"));
        // DEI 0.820 vs avg 0.745 -> +0.075, Excellent
        assert!(report.contains("+0.075"));
        assert!(report.contains("Excellent"));
        // UBS 0.300 vs avg 0.400 -> -0.100
        assert!(report.contains("-0.100"));
        assert!(report.contains("STATUS: District Performing Well"));
    }

    #[test]
    fn report_picks_issue_specific_suggestions() {
        let (mut record, means) = sample();
        record.dei = 0.4;
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).single().expect("timestamp");
        let report = generate_district_report(&record, &means, when);
        assert!(report.contains("STATUS: Critical Equity Gap"));
        assert!(report.contains("immediate, comprehensive intervention"));
    }
}

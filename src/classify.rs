use crate::model::{
    Badge, BadgeLabel, Direction, DistrictRecord, Intervention, IssueType, Metric, Recommendation,
    RecommendationLevel, RiskCategory,
};

#[derive(Debug, Clone, Copy)]
enum Breach {
    Below(f64),
    Above(f64),
}

impl Breach {
    fn crossed(self, value: f64) -> bool {
        match self {
            Breach::Below(limit) => value < limit,
            Breach::Above(limit) => value > limit,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ThresholdRule {
    metric: Metric,
    breach: Breach,
    issue: IssueType,
}

// Priority order is part of the product: a district breaching several
// thresholds is always reported under the first rule that fires.
const THRESHOLD_RULES: [ThresholdRule; 4] = [
    ThresholdRule {
        metric: Metric::Dei,
        breach: Breach::Below(0.5),
        issue: IssueType::Critical,
    },
    ThresholdRule {
        metric: Metric::Ahs,
        breach: Breach::Below(0.5),
        issue: IssueType::AccessStress,
    },
    ThresholdRule {
        metric: Metric::Ubs,
        breach: Breach::Above(0.7),
        issue: IssueType::UpdateBurden,
    },
    ThresholdRule {
        metric: Metric::Srs,
        breach: Breach::Above(0.6),
        issue: IssueType::StabilityRisk,
    },
];

fn first_breach(record: &DistrictRecord, include_dei: bool) -> IssueType {
    for rule in &THRESHOLD_RULES {
        if rule.metric == Metric::Dei && !include_dei {
            continue;
        }
        if rule.breach.crossed(record.score(rule.metric)) {
            return rule.issue;
        }
    }
    IssueType::Healthy
}

/// Primary issue tag for a district, with the composite DEI checked before
/// the per-dimension scores.
pub fn issue_type(record: &DistrictRecord) -> IssueType {
    first_breach(record, true)
}

/// Risk bucket used for dashboard grouping. Same rule tail as [`issue_type`]
/// but without the DEI override, so a low-DEI district whose dimension
/// scores all pass still counts as Healthy here.
pub fn risk_category(record: &DistrictRecord) -> RiskCategory {
    match first_breach(record, false) {
        IssueType::AccessStress => RiskCategory::AccessStress,
        IssueType::UpdateBurden => RiskCategory::UpdateBurden,
        IssueType::StabilityRisk => RiskCategory::StabilityRisk,
        IssueType::Critical | IssueType::Healthy => RiskCategory::Healthy,
    }
}

pub fn badge(score: f64, direction: Direction) -> Badge {
    let label = match direction {
        Direction::HigherIsBetter => {
            if score >= 0.75 {
                BadgeLabel::Excellent
            } else if score >= 0.5 {
                BadgeLabel::Good
            } else if score >= 0.3 {
                BadgeLabel::NeedsAttention
            } else {
                BadgeLabel::Critical
            }
        }
        Direction::LowerIsBetter => {
            if score <= 0.25 {
                BadgeLabel::Excellent
            } else if score <= 0.5 {
                BadgeLabel::Good
            } else if score <= 0.7 {
                BadgeLabel::NeedsAttention
            } else {
                BadgeLabel::Critical
            }
        }
    };
    let (color, icon) = match label {
        BadgeLabel::Excellent => ("#22c55e", "\u{1f7e2}"),
        BadgeLabel::Good => ("#84cc16", "\u{1f7e1}"),
        BadgeLabel::NeedsAttention => ("#f59e0b", "\u{1f7e0}"),
        BadgeLabel::Critical => ("#ef4444", "\u{1f534}"),
    };
    Badge { label, color, icon }
}

pub fn metric_badge(record: &DistrictRecord, metric: Metric) -> Badge {
    badge(record.score(metric), metric.direction())
}

pub fn recommendation(record: &DistrictRecord) -> Recommendation {
    match issue_type(record) {
        IssueType::Critical => Recommendation {
            level: RecommendationLevel::Critical,
            title: "Critical Equity Gap",
            message: "This district requires immediate attention. DEI score is critically low.",
            action: "Prioritize comprehensive resource allocation and infrastructure development.",
        },
        IssueType::AccessStress => Recommendation {
            level: RecommendationLevel::Warning,
            title: "High Access Stress",
            message: "District faces challenges in enrollment accessibility.",
            action: "Focus on enrollment infrastructure - add more centers, improve connectivity.",
        },
        IssueType::UpdateBurden => Recommendation {
            level: RecommendationLevel::Warning,
            title: "Update Overload",
            message: "High volume of update requests straining system capacity.",
            action: "Streamline update processes - consider mobile camps, optimize workflows.",
        },
        IssueType::StabilityRisk => Recommendation {
            level: RecommendationLevel::Warning,
            title: "Stability Concerns",
            message: "Inconsistent service delivery detected.",
            action: "Review system uptime, data quality, and operational consistency.",
        },
        IssueType::Healthy => Recommendation {
            level: RecommendationLevel::Good,
            title: "District Performing Well",
            message: "All metrics are within acceptable ranges.",
            action: "Maintain current operations and continue monitoring.",
        },
    }
}

/// Multi-line intervention text for generated reports.
pub fn detailed_suggestion(issue: IssueType) -> &'static str {
    match issue {
        IssueType::AccessStress => {
            "The district shows signs of enrollment infrastructure strain. Consider the following actions:\n\
             1. Increase the number of active enrollment centers, particularly in rural areas\n\
             2. Deploy mobile enrollment vans to reach underserved populations\n\
             3. Partner with local government offices (panchayats, schools) for additional enrollment points\n\
             4. Review and optimize appointment scheduling to reduce wait times"
        }
        IssueType::UpdateBurden => {
            "The district is experiencing high update request volumes. Recommended interventions:\n\
             1. Set up dedicated biometric update camps in high-demand areas\n\
             2. Implement online appointment booking to manage walk-in crowds\n\
             3. Consider extending operating hours during peak update periods\n\
             4. Ensure adequate staff and equipment to handle update volumes efficiently"
        }
        IssueType::StabilityRisk => {
            "Service delivery in this district shows inconsistency. Key improvements needed:\n\
             1. Audit system uptime and address recurring technical failures\n\
             2. Ensure reliable power backup and internet connectivity at all centers\n\
             3. Train staff on troubleshooting common issues to minimize downtime\n\
             4. Establish regular maintenance schedules for all enrollment devices"
        }
        IssueType::Critical => {
            "This district requires immediate, comprehensive intervention:\n\
             1. Conduct a full assessment of current infrastructure and staffing\n\
             2. Allocate emergency resources to address critical gaps\n\
             3. Establish a dedicated task force to monitor daily operations\n\
             4. Implement weekly progress tracking with escalation protocols"
        }
        IssueType::Healthy => {
            "The district is performing well. To maintain and improve:\n\
             1. Continue regular monitoring of all key metrics\n\
             2. Document best practices for knowledge sharing with other districts\n\
             3. Consider pilot programs for new service innovations\n\
             4. Maintain staff training and equipment maintenance schedules"
        }
    }
}

/// One-line suggestion for inline dashboard display.
pub fn simple_suggestion(issue: IssueType) -> &'static str {
    match issue {
        IssueType::AccessStress => "Add more enrollment centers and deploy mobile vans",
        IssueType::UpdateBurden => "Set up dedicated update camps",
        IssueType::StabilityRisk => "Audit system uptime and power/internet",
        IssueType::Critical => "Allocate emergency resources now",
        IssueType::Healthy => "Maintain current operations",
    }
}

/// Intervention mapping used by the planning table. Tiers on DEI first, then
/// picks the dominant stressor within the tier.
pub fn intervention(record: &DistrictRecord) -> Intervention {
    if record.dei < 0.7 {
        if record.ahs < 0.5 && record.srs > 0.6 {
            Intervention {
                dominant_risk: "Access + Stability Crisis",
                action: "Urgent: New centers + Infra audit",
            }
        } else if record.ahs < 0.6 {
            Intervention {
                dominant_risk: "Severe Access Deficit",
                action: "Deploy mobile vans + New centers",
            }
        } else if record.srs > 0.6 {
            Intervention {
                dominant_risk: "High Stability Risk",
                action: "Technical audit + Connectivity upgrade",
            }
        } else {
            Intervention {
                dominant_risk: "General Quality Critical",
                action: "Complete district review required",
            }
        }
    } else if record.dei < 0.8 {
        if record.ubs > 0.6 {
            Intervention {
                dominant_risk: "High Update Burden",
                action: "Setup dedicated update camps",
            }
        } else if record.ahs < 0.7 {
            Intervention {
                dominant_risk: "Moderate Access Stress",
                action: "Extend center operating hours",
            }
        } else {
            Intervention {
                dominant_risk: "Borderline Performance",
                action: "Monitor weekly + Staff training",
            }
        }
    } else {
        Intervention {
            dominant_risk: "Healthy State",
            action: "Reference model for other districts",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(dei: f64, ahs: f64, ubs: f64, srs: f64) -> DistrictRecord {
        DistrictRecord {
            state: "Testland".to_string(),
            district: "sample".to_string(),
            dei,
            ahs,
            ubs,
            srs,
        }
    }

    #[test]
    fn badge_boundaries_higher_is_better() {
        assert_eq!(badge(0.75, Direction::HigherIsBetter).label, BadgeLabel::Excellent);
        assert_eq!(badge(0.749_999, Direction::HigherIsBetter).label, BadgeLabel::Good);
        assert_eq!(badge(0.5, Direction::HigherIsBetter).label, BadgeLabel::Good);
        assert_eq!(badge(0.3, Direction::HigherIsBetter).label, BadgeLabel::NeedsAttention);
        assert_eq!(badge(0.299, Direction::HigherIsBetter).label, BadgeLabel::Critical);
    }

    #[test]
    fn badge_boundaries_lower_is_better() {
        assert_eq!(badge(0.25, Direction::LowerIsBetter).label, BadgeLabel::Excellent);
        assert_eq!(badge(0.5, Direction::LowerIsBetter).label, BadgeLabel::Good);
        assert_eq!(badge(0.7, Direction::LowerIsBetter).label, BadgeLabel::NeedsAttention);
        assert_eq!(badge(0.700_01, Direction::LowerIsBetter).label, BadgeLabel::Critical);
    }

    #[test]
    fn badge_is_monotonic_across_boundaries() {
        let ranks = |direction: Direction| {
            [0.0, 0.29, 0.3, 0.49, 0.5, 0.74, 0.75, 1.0]
                .iter()
                .map(|&s| badge(s, direction).label)
                .collect::<Vec<_>>()
        };
        let higher = ranks(Direction::HigherIsBetter);
        let mut sorted = higher.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(higher, sorted);

        let lower = ranks(Direction::LowerIsBetter);
        let mut sorted = lower.clone();
        sorted.sort();
        assert_eq!(lower, sorted);
    }

    #[test]
    fn badge_tolerates_out_of_range_scores() {
        assert_eq!(badge(-3.0, Direction::HigherIsBetter).label, BadgeLabel::Critical);
        assert_eq!(badge(17.0, Direction::HigherIsBetter).label, BadgeLabel::Excellent);
        assert_eq!(badge(-3.0, Direction::LowerIsBetter).label, BadgeLabel::Excellent);
        assert_eq!(badge(17.0, Direction::LowerIsBetter).label, BadgeLabel::Critical);
    }

    #[test]
    fn risk_category_priority_access_beats_update() {
        let r = record(0.9, 0.4, 0.9, 0.1);
        assert_eq!(risk_category(&r), RiskCategory::AccessStress);
    }

    #[test]
    fn issue_type_dei_override() {
        let r = record(0.4, 0.9, 0.1, 0.1);
        assert_eq!(issue_type(&r), IssueType::Critical);
    }

    #[test]
    fn rule_tables_diverge_on_low_dei_only() {
        // Low composite but every dimension passes: issue flags it, risk does not.
        let r = record(0.45, 0.6, 0.3, 0.2);
        assert_eq!(issue_type(&r), IssueType::Critical);
        assert_eq!(risk_category(&r), RiskCategory::Healthy);
        assert_eq!(recommendation(&r).level, RecommendationLevel::Critical);
    }

    #[test]
    fn stability_rule_fires_last() {
        let r = record(0.8, 0.8, 0.2, 0.61);
        assert_eq!(risk_category(&r), RiskCategory::StabilityRisk);
        assert_eq!(issue_type(&r), IssueType::StabilityRisk);
    }

    #[test]
    fn healthy_fallback_when_no_threshold_crossed() {
        let r = record(0.8, 0.8, 0.2, 0.2);
        assert_eq!(risk_category(&r), RiskCategory::Healthy);
        assert_eq!(issue_type(&r), IssueType::Healthy);
        assert_eq!(recommendation(&r).level, RecommendationLevel::Good);
    }

    #[test]
    fn boundary_values_do_not_trigger_rules() {
        // Thresholds are strict comparisons; sitting exactly on one is a pass.
        let r = record(0.5, 0.5, 0.7, 0.6);
        assert_eq!(issue_type(&r), IssueType::Healthy);
        assert_eq!(risk_category(&r), RiskCategory::Healthy);
    }

    #[test]
    fn suggestions_cover_every_issue() {
        for issue in [
            IssueType::Critical,
            IssueType::AccessStress,
            IssueType::UpdateBurden,
            IssueType::StabilityRisk,
            IssueType::Healthy,
        ] {
            assert!(!detailed_suggestion(issue).is_empty());
            assert!(!simple_suggestion(issue).is_empty());
        }
    }

    #[test]
    fn intervention_tiers() {
        let crisis = record(0.6, 0.4, 0.2, 0.7);
        assert_eq!(intervention(&crisis).dominant_risk, "Access + Stability Crisis");

        let access = record(0.6, 0.55, 0.2, 0.2);
        assert_eq!(intervention(&access).dominant_risk, "Severe Access Deficit");

        let stability = record(0.6, 0.9, 0.2, 0.7);
        assert_eq!(intervention(&stability).dominant_risk, "High Stability Risk");

        let general = record(0.6, 0.9, 0.2, 0.2);
        assert_eq!(intervention(&general).dominant_risk, "General Quality Critical");

        let update = record(0.75, 0.9, 0.65, 0.2);
        assert_eq!(intervention(&update).dominant_risk, "High Update Burden");

        let moderate = record(0.75, 0.65, 0.2, 0.2);
        assert_eq!(intervention(&moderate).dominant_risk, "Moderate Access Stress");

        let borderline = record(0.75, 0.9, 0.2, 0.2);
        assert_eq!(intervention(&borderline).dominant_risk, "Borderline Performance");

        let healthy = record(0.85, 0.9, 0.2, 0.2);
        assert_eq!(intervention(&healthy).dominant_risk, "Healthy State");
    }
}

use anyhow::Result;

use crate::aggregate::StateRollup;
use crate::classify::{intervention, issue_type, risk_category};
use crate::model::DistrictRecord;

pub fn districts_to_csv(records: &[DistrictRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "state",
        "district",
        "dei",
        "ahs",
        "ubs",
        "srs",
        "risk_category",
        "issue_type",
    ])?;
    for record in records {
        writer.write_record([
            record.state.clone(),
            record.district.clone(),
            format!("{:.4}", record.dei),
            format!("{:.4}", record.ahs),
            format!("{:.4}", record.ubs),
            format!("{:.4}", record.srs),
            risk_category(record).to_string(),
            issue_type(record).to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn rollups_to_csv(rollups: &[StateRollup]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "state",
        "districts",
        "mean_dei",
        "mean_ahs",
        "mean_ubs",
        "mean_srs",
        "category",
    ])?;
    for rollup in rollups {
        writer.write_record([
            rollup.state.clone(),
            rollup.districts.to_string(),
            format!("{:.4}", rollup.means.mean_dei),
            format!("{:.4}", rollup.means.mean_ahs),
            format!("{:.4}", rollup.means.mean_ubs),
            format!("{:.4}", rollup.means.mean_srs),
            rollup.category.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn interventions_to_csv(records: &[DistrictRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["state", "district", "dei", "dominant_risk", "suggested_action"])?;
    for record in records {
        let plan = intervention(record);
        writer.write_record([
            record.state.clone(),
            record.district.clone(),
            format!("{:.4}", record.dei),
            plan.dominant_risk.to_string(),
            plan.action.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn districts_csv_carries_classification_columns() {
        let records = vec![DistrictRecord {
            state: "X".to_string(),
            district: "sample".to_string(),
            dei: 0.4,
            ahs: 0.9,
            ubs: 0.2,
            srs: 0.2,
        }];
        let rendered = districts_to_csv(&records).expect("render csv");
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some("state,district,dei,ahs,ubs,srs,risk_category,issue_type")
        );
        let row = lines.next().expect("data row");
        assert!(row.ends_with("Healthy,critical"));
    }
}

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::model::DistrictRecord;

// The master CSV keeps the upstream column casing. `ASS` is the pre-rename
// header for the access column; both revisions of the file are in the wild.
#[derive(Debug, Clone, Deserialize)]
struct RawRow {
    state: String,
    district: String,
    #[serde(rename = "DEI")]
    dei: f64,
    #[serde(rename = "AHS", alias = "ASS")]
    ahs: f64,
    #[serde(rename = "UBS")]
    ubs: f64,
    #[serde(rename = "SRS")]
    srs: f64,
}

impl From<RawRow> for DistrictRecord {
    fn from(row: RawRow) -> Self {
        Self {
            state: row.state,
            district: row.district,
            dei: row.dei,
            ahs: row.ahs,
            ubs: row.ubs,
            srs: row.srs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<DistrictRecord>,
    pub source: PathBuf,
    pub fingerprint: String,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed reading dataset: {}", path.display()))?;
        let records = parse_records(raw.as_slice())
            .with_context(|| format!("failed parsing dataset: {}", path.display()))?;
        Ok(Self {
            records,
            source: path.to_path_buf(),
            fingerprint: fingerprint(&raw),
        })
    }

    pub fn states(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self.records.iter().map(|r| r.state.as_str()).collect();
        unique.into_iter().map(str::to_string).collect()
    }

    pub fn state_records(&self, state: &str) -> Vec<DistrictRecord> {
        self.records
            .iter()
            .filter(|r| r.state.eq_ignore_ascii_case(state))
            .cloned()
            .collect()
    }

    pub fn find_district(&self, state: &str, district: &str) -> Option<&DistrictRecord> {
        self.records.iter().find(|r| {
            r.state.eq_ignore_ascii_case(state) && r.district.eq_ignore_ascii_case(district)
        })
    }
}

pub fn fingerprint(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    format!("{:x}", hasher.finalize())
}

pub fn parse_records<R: Read>(reader: R) -> Result<Vec<DistrictRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in csv_reader.deserialize::<RawRow>() {
        records.push(row?.into());
    }
    Ok(records)
}

/// Merge an auxiliary per-state file into the master set. Existing rows for
/// the incoming states are dropped first so re-running the merge with the
/// same file is a no-op.
pub fn merge_records(
    master: &[DistrictRecord],
    incoming: &[DistrictRecord],
) -> Vec<DistrictRecord> {
    let incoming_states: BTreeSet<&str> = incoming.iter().map(|r| r.state.as_str()).collect();
    let mut merged: Vec<DistrictRecord> = master
        .iter()
        .filter(|r| !incoming_states.contains(r.state.as_str()))
        .cloned()
        .collect();
    merged.extend(incoming.iter().cloned());
    merged.sort_by(|a, b| {
        (a.state.as_str(), a.district.as_str()).cmp(&(b.state.as_str(), b.district.as_str()))
    });
    merged
}

pub fn records_to_csv(records: &[DistrictRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["state", "district", "DEI", "AHS", "UBS", "SRS"])?;
    for r in records {
        writer.write_record([
            r.state.clone(),
            r.district.clone(),
            r.dei.to_string(),
            r.ahs.to_string(),
            r.ubs.to_string(),
            r.srs.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn write_records(path: &Path, records: &[DistrictRecord]) -> Result<()> {
    let data = records_to_csv(records)?;
    fs::write(path, data).with_context(|| format!("failed writing dataset: {}", path.display()))
}

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use equity_nexus::aggregate::{
    national_summary, rank_extremes, risk_counts, state_insights, state_rollups, state_summary,
};
use equity_nexus::classify::{
    intervention, issue_type, recommendation, risk_category, simple_suggestion,
};
use equity_nexus::config::{Config, ConfigOverrides};
use equity_nexus::dataset::{merge_records, parse_records, write_records, Dataset};
use equity_nexus::model::{DistrictRecord, IssueType, RiskCategory};
use equity_nexus::output::csv::{districts_to_csv, interventions_to_csv, rollups_to_csv};
use equity_nexus::output::json::render_json;
use equity_nexus::output::table::{
    render_detail_table, render_districts_table, render_interventions_table,
    render_national_table, render_rollup_table, render_summary_table,
};
use equity_nexus::report::generate_district_report;
use equity_nexus::server::run_server;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "equity-nexus",
    about = "District digital-equity analytics and dashboard backend"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Master dataset CSV, overriding the configured path
    #[arg(short, long)]
    data: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// State KPI means, badges, and risk breakdown
    Summary {
        #[arg(short, long)]
        state: String,
    },
    /// Per-district scores ranked by DEI
    Districts {
        #[arg(short, long)]
        state: String,
    },
    /// State-level insight lines
    Insights {
        #[arg(short, long)]
        state: String,
    },
    /// District intervention mapping, most critical first
    Interventions {
        #[arg(short, long)]
        state: String,
    },
    /// Score breakdown and recommendation for one district
    District {
        #[arg(short, long)]
        state: String,
        #[arg(short = 'D', long)]
        district: String,
    },
    /// Generate the plain-text district report
    Report {
        #[arg(short, long)]
        state: String,
        #[arg(short = 'D', long)]
        district: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write to the configured report directory
        #[arg(long)]
        save: bool,
    },
    /// National rollup across all states
    National,
    /// Merge an auxiliary per-state CSV into the master dataset
    Merge {
        #[arg(long)]
        file: PathBuf,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Serialize)]
struct SummaryOut {
    state: String,
    districts: usize,
    means: equity_nexus::aggregate::ScoreSummary,
    risk_counts: std::collections::BTreeMap<RiskCategory, usize>,
    best: DistrictRecord,
    worst: DistrictRecord,
}

#[derive(Debug, Serialize)]
struct DistrictOut {
    #[serde(flatten)]
    record: DistrictRecord,
    risk_category: RiskCategory,
    issue_type: IssueType,
}

#[derive(Debug, Serialize)]
struct InterventionOut {
    #[serde(flatten)]
    record: DistrictRecord,
    dominant_risk: &'static str,
    suggested_action: &'static str,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        csv_path: cli
            .data
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }

    let csv_path = config.resolved_csv_path();
    let dataset = Dataset::load(&csv_path)?;
    info!(
        "loaded {} districts across {} states from {}",
        dataset.records.len(),
        dataset.states().len(),
        csv_path.display()
    );

    if let Commands::Serve { host, port } = &cli.command {
        let host = host.clone().unwrap_or_else(|| config.server.host.clone());
        let port = port.unwrap_or(config.server.port);
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, dataset, addr).await;
    }

    match &cli.command {
        Commands::Summary { state } => {
            let records = state_records(&dataset, state)?;
            let means = state_summary(&records)?;
            let counts = risk_counts(&records);
            match cli.output {
                OutputFormat::Table => println!("{}", render_summary_table(&means, &counts)),
                OutputFormat::Json | OutputFormat::Csv => {
                    if matches!(cli.output, OutputFormat::Csv) {
                        warn!("CSV output for summary not implemented, using JSON");
                    }
                    let extremes = rank_extremes(&records)?;
                    println!(
                        "{}",
                        render_json(&SummaryOut {
                            state: records[0].state.clone(),
                            districts: records.len(),
                            means,
                            risk_counts: counts,
                            best: extremes.best,
                            worst: extremes.worst,
                        })?
                    );
                }
            }
        }
        Commands::Districts { state } => {
            let records = state_records(&dataset, state)?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_districts_table(&records)),
                OutputFormat::Json => println!("{}", render_json(&district_rows(&records))?),
                OutputFormat::Csv => println!("{}", districts_to_csv(&records)?),
            }
        }
        Commands::Insights { state } => {
            let records = state_records(&dataset, state)?;
            let insights = state_insights(&records)?;
            match cli.output {
                OutputFormat::Table => {
                    for line in &insights {
                        println!("- {line}");
                    }
                }
                OutputFormat::Json => println!("{}", render_json(&insights)?),
                OutputFormat::Csv => {
                    warn!("CSV output for insights not implemented, using JSON");
                    println!("{}", render_json(&insights)?);
                }
            }
        }
        Commands::Interventions { state } => {
            let records = state_records(&dataset, state)?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_interventions_table(&records)),
                OutputFormat::Json => {
                    let rows: Vec<InterventionOut> = records
                        .iter()
                        .map(|record| {
                            let plan = intervention(record);
                            InterventionOut {
                                record: record.clone(),
                                dominant_risk: plan.dominant_risk,
                                suggested_action: plan.action,
                            }
                        })
                        .collect();
                    println!("{}", render_json(&rows)?);
                }
                OutputFormat::Csv => println!("{}", interventions_to_csv(&records)?),
            }
        }
        Commands::District { state, district } => {
            let record = dataset
                .find_district(state, district)
                .ok_or_else(|| anyhow!("unknown district: {district} ({state})"))?
                .clone();
            let records = state_records(&dataset, state)?;
            let means = state_summary(&records)?;
            let issue = issue_type(&record);
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_detail_table(&record, &means));
                    let rec = recommendation(&record);
                    println!("[{:?}] {}", rec.level, rec.title);
                    println!("Assessment: {}", rec.message);
                    println!("Recommended action: {}", rec.action);
                    println!("Quick improvement: {}", simple_suggestion(issue));
                }
                OutputFormat::Json | OutputFormat::Csv => {
                    if matches!(cli.output, OutputFormat::Csv) {
                        warn!("CSV output for district detail not implemented, using JSON");
                    }
                    #[derive(Debug, Serialize)]
                    struct DetailOut {
                        record: DistrictRecord,
                        risk_category: RiskCategory,
                        issue_type: IssueType,
                        recommendation: equity_nexus::model::Recommendation,
                        simple_suggestion: &'static str,
                    }
                    println!(
                        "{}",
                        render_json(&DetailOut {
                            risk_category: risk_category(&record),
                            issue_type: issue,
                            recommendation: recommendation(&record),
                            simple_suggestion: simple_suggestion(issue),
                            record,
                        })?
                    );
                }
            }
        }
        Commands::Report {
            state,
            district,
            out,
            save,
        } => {
            let record = dataset
                .find_district(state, district)
                .ok_or_else(|| anyhow!("unknown district: {district} ({state})"))?
                .clone();
            let records = state_records(&dataset, state)?;
            let means = state_summary(&records)?;
            let report = generate_district_report(&record, &means, Utc::now());

            let target = if let Some(path) = out {
                Some(path.clone())
            } else if *save {
                let dir = config.resolved_report_dir();
                fs::create_dir_all(&dir)?;
                Some(dir.join(format!(
                    "{}_report.txt",
                    record.district.to_lowercase().replace(' ', "_")
                )))
            } else {
                None
            };

            match target {
                Some(path) => {
                    fs::write(&path, report)?;
                    info!("report written to {}", path.display());
                }
                None => println!("{report}"),
            }
        }
        Commands::National => {
            let national = national_summary(&dataset.records)?;
            let rollups = state_rollups(&dataset.records)?;
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_national_table(&national));
                    println!("{}", render_rollup_table(&rollups));
                }
                OutputFormat::Json => {
                    #[derive(Debug, Serialize)]
                    struct NationalOut {
                        summary: equity_nexus::aggregate::NationalSummary,
                        rollups: Vec<equity_nexus::aggregate::StateRollup>,
                    }
                    println!(
                        "{}",
                        render_json(&NationalOut {
                            summary: national,
                            rollups,
                        })?
                    );
                }
                OutputFormat::Csv => println!("{}", rollups_to_csv(&rollups)?),
            }
        }
        Commands::Merge { file } => {
            let raw = fs::read(file)
                .map_err(|e| anyhow!("failed reading merge file {}: {e}", file.display()))?;
            let incoming = parse_records(raw.as_slice())?;
            if incoming.is_empty() {
                return Err(anyhow!("merge file has no records: {}", file.display()));
            }
            let before = dataset.records.len();
            let merged = merge_records(&dataset.records, &incoming);
            write_records(&csv_path, &merged)?;
            info!(
                "merged {} incoming row(s): {} -> {} total",
                incoming.len(),
                before,
                merged.len()
            );
        }
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn state_records(dataset: &Dataset, state: &str) -> Result<Vec<DistrictRecord>> {
    let records = dataset.state_records(state);
    if records.is_empty() {
        return Err(anyhow!("unknown state: {state}"));
    }
    Ok(records)
}

fn district_rows(records: &[DistrictRecord]) -> Vec<DistrictOut> {
    let mut sorted: Vec<&DistrictRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.dei.partial_cmp(&a.dei).unwrap_or(std::cmp::Ordering::Equal));
    sorted
        .into_iter()
        .map(|record| DistrictOut {
            record: record.clone(),
            risk_category: risk_category(record),
            issue_type: issue_type(record),
        })
        .collect()
}

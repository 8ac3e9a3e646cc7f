use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::aggregate::{
    national_summary, rank_extremes, risk_counts, state_insights, state_rollups, state_summary,
    Extremes, NationalSummary, ScoreSummary, StateRollup,
};
use crate::classify::{
    detailed_suggestion, intervention, issue_type, metric_badge, recommendation, risk_category,
    simple_suggestion,
};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::model::{
    Badge, DistrictRecord, Intervention, IssueType, Metric, Recommendation, RiskCategory,
};
use crate::report::generate_district_report;

#[derive(Clone)]
struct ApiState {
    config: Config,
    dataset: Arc<Dataset>,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    districts: usize,
    states: usize,
    fingerprint: String,
}

#[derive(Debug, Serialize)]
struct MetricSummary {
    metric: Metric,
    name: &'static str,
    mean: f64,
    badge: Badge,
}

#[derive(Debug, Serialize)]
struct StateSummaryResponse {
    state: String,
    districts: usize,
    means: ScoreSummary,
    metrics: Vec<MetricSummary>,
    risk_counts: BTreeMap<RiskCategory, usize>,
    extremes: Extremes,
}

#[derive(Debug, Serialize)]
struct DistrictRow {
    #[serde(flatten)]
    record: DistrictRecord,
    risk_category: RiskCategory,
    issue_type: IssueType,
}

#[derive(Debug, Serialize)]
struct StateDistrictsResponse {
    state: String,
    districts: Vec<DistrictRow>,
}

#[derive(Debug, Serialize)]
struct StateInsightsResponse {
    state: String,
    insights: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DistrictDetailResponse {
    record: DistrictRecord,
    badges: Vec<MetricSummary>,
    risk_category: RiskCategory,
    issue_type: IssueType,
    recommendation: Recommendation,
    simple_suggestion: &'static str,
    detailed_suggestion: &'static str,
    intervention: Intervention,
}

#[derive(Debug, Serialize)]
struct NationalResponse {
    summary: NationalSummary,
    rollups: Vec<StateRollup>,
}

pub async fn run_server(config: Config, dataset: Dataset, bind: SocketAddr) -> Result<()> {
    let state = ApiState {
        config,
        dataset: Arc::new(dataset),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/states", get(states))
        .route("/v1/national", get(national))
        .route("/v1/states/:state/summary", get(summary))
        .route("/v1/states/:state/districts", get(districts))
        .route("/v1/states/:state/insights", get(insights))
        .route("/v1/states/:state/districts/:district", get(district_detail))
        .route(
            "/v1/states/:state/districts/:district/report",
            get(district_report),
        )
        .route("/v1/config", get(show_config))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<ApiState>) -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        districts: state.dataset.records.len(),
        states: state.dataset.states().len(),
        fingerprint: state.dataset.fingerprint.clone(),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn states(State(state): State<ApiState>) -> Json<ApiResponse<Vec<String>>> {
    ok(state.dataset.states())
}

async fn national(State(state): State<ApiState>) -> ApiResult<NationalResponse> {
    let summary =
        national_summary(&state.dataset.records).map_err(ApiError::internal)?;
    let rollups = state_rollups(&state.dataset.records).map_err(ApiError::internal)?;
    Ok(ok(NationalResponse { summary, rollups }))
}

async fn summary(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<StateSummaryResponse> {
    let records = state_records_or_404(&state.dataset, &name)?;
    let means = state_summary(&records).map_err(ApiError::internal)?;
    let extremes = rank_extremes(&records).map_err(ApiError::internal)?;
    let metrics = metric_summaries(&means);

    Ok(ok(StateSummaryResponse {
        state: records[0].state.clone(),
        districts: records.len(),
        means,
        metrics,
        risk_counts: risk_counts(&records),
        extremes,
    }))
}

async fn districts(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<StateDistrictsResponse> {
    let mut records = state_records_or_404(&state.dataset, &name)?;
    records.sort_by(|a, b| b.dei.partial_cmp(&a.dei).unwrap_or(std::cmp::Ordering::Equal));
    let state_name = records[0].state.clone();
    let districts = records
        .into_iter()
        .map(|record| DistrictRow {
            risk_category: risk_category(&record),
            issue_type: issue_type(&record),
            record,
        })
        .collect();

    Ok(ok(StateDistrictsResponse {
        state: state_name,
        districts,
    }))
}

async fn insights(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<StateInsightsResponse> {
    let records = state_records_or_404(&state.dataset, &name)?;
    let insights = state_insights(&records).map_err(ApiError::internal)?;
    Ok(ok(StateInsightsResponse {
        state: records[0].state.clone(),
        insights,
    }))
}

async fn district_detail(
    State(state): State<ApiState>,
    Path((state_name, district_name)): Path<(String, String)>,
) -> ApiResult<DistrictDetailResponse> {
    let (record, means) = district_or_404(&state.dataset, &state_name, &district_name)?;
    let issue = issue_type(&record);

    Ok(ok(DistrictDetailResponse {
        badges: metric_badges(&record, &means),
        risk_category: risk_category(&record),
        issue_type: issue,
        recommendation: recommendation(&record),
        simple_suggestion: simple_suggestion(issue),
        detailed_suggestion: detailed_suggestion(issue),
        intervention: intervention(&record),
        record,
    }))
}

async fn district_report(
    State(state): State<ApiState>,
    Path((state_name, district_name)): Path<(String, String)>,
) -> std::result::Result<String, ApiError> {
    let (record, means) = district_or_404(&state.dataset, &state_name, &district_name)?;
    Ok(generate_district_report(&record, &means, Utc::now()))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn metric_summaries(means: &ScoreSummary) -> Vec<MetricSummary> {
    Metric::ALL
        .iter()
        .map(|&metric| {
            let mean = means.mean(metric);
            MetricSummary {
                metric,
                name: metric.full_name(),
                mean,
                badge: crate::classify::badge(mean, metric.direction()),
            }
        })
        .collect()
}

fn metric_badges(record: &DistrictRecord, means: &ScoreSummary) -> Vec<MetricSummary> {
    Metric::ALL
        .iter()
        .map(|&metric| MetricSummary {
            metric,
            name: metric.full_name(),
            mean: means.mean(metric),
            badge: metric_badge(record, metric),
        })
        .collect()
}

fn state_records_or_404(
    dataset: &Dataset,
    state: &str,
) -> std::result::Result<Vec<DistrictRecord>, ApiError> {
    let records = dataset.state_records(state);
    if records.is_empty() {
        return Err(ApiError::not_found(format!("unknown state: {state}")));
    }
    Ok(records)
}

fn district_or_404(
    dataset: &Dataset,
    state: &str,
    district: &str,
) -> std::result::Result<(DistrictRecord, ScoreSummary), ApiError> {
    let records = state_records_or_404(dataset, state)?;
    let means = state_summary(&records).map_err(ApiError::internal)?;
    let record = dataset
        .find_district(state, district)
        .ok_or_else(|| ApiError::not_found(format!("unknown district: {district}")))?;
    Ok((record.clone(), means))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::dataset::parse_records;

    fn test_dataset() -> Dataset {
        let records = parse_records(
            "state,district,DEI,AHS,UBS,SRS\n\
             Andhra Pradesh,guntur,0.82,0.9,0.3,0.2\n\
             Andhra Pradesh,chittoor,0.67,0.55,0.4,0.5\n\
             Kerala,kollam,0.91,0.95,0.2,0.1\n"
                .as_bytes(),
        )
        .expect("fixture parses");
        Dataset {
            records,
            source: PathBuf::from("fixture.csv"),
            fingerprint: "test".to_string(),
        }
    }

    #[test]
    fn state_lookup_is_case_insensitive() {
        let dataset = test_dataset();
        let records = state_records_or_404(&dataset, "andhra pradesh").expect("state found");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn unknown_state_is_404() {
        let dataset = test_dataset();
        let err = state_records_or_404(&dataset, "atlantis").unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn district_lookup_returns_state_means() {
        let dataset = test_dataset();
        let (record, means) =
            district_or_404(&dataset, "Andhra Pradesh", "GUNTUR").expect("district found");
        assert_eq!(record.district, "guntur");
        assert!((means.mean_dei - (0.82 + 0.67) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_district_is_404() {
        let dataset = test_dataset();
        let err = district_or_404(&dataset, "Kerala", "guntur").unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}

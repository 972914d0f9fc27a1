use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;

use crate::core::{
    AllocationEngine, AllocationMethod, AllocationSlice, AllocationStrategy, AppAllocation,
    CoreError, HistoryPoint, HistorySimulator, MarketConfig, Portfolio, PortfolioAsset,
    PortfolioHolding, PortfolioSnapshot, ProjectionPoint, QuestionnaireResponse, RiskBand,
    RiskProfile, RiskScorer, allocation_from_snapshot, annualized_return, composition_risk_score,
    max_drawdown, project, rebalance, volatility,
};
use crate::oracle::{Assessment, OracleClient, PortfolioComposition, fallback_assessment};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliAllocationMethod {
    BandLookup,
    MeanVariance,
}

impl From<CliAllocationMethod> for AllocationMethod {
    fn from(value: CliAllocationMethod) -> Self {
        match value {
            CliAllocationMethod::BandLookup => AllocationMethod::BandLookup,
            CliAllocationMethod::MeanVariance => AllocationMethod::MeanVariance,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiAllocationMethod {
    #[serde(alias = "band", alias = "bandLookup")]
    BandLookup,
    #[serde(alias = "optimizer", alias = "meanVariance")]
    MeanVariance,
}

impl From<ApiAllocationMethod> for AllocationMethod {
    fn from(value: ApiAllocationMethod) -> Self {
        match value {
            ApiAllocationMethod::BandLookup => AllocationMethod::BandLookup,
            ApiAllocationMethod::MeanVariance => AllocationMethod::MeanVariance,
        }
    }
}

impl From<AllocationMethod> for ApiAllocationMethod {
    fn from(value: AllocationMethod) -> Self {
        match value {
            AllocationMethod::BandLookup => ApiAllocationMethod::BandLookup,
            AllocationMethod::MeanVariance => ApiAllocationMethod::MeanVariance,
        }
    }
}

/// `serve` options. The defaults double as the API defaults for request
/// fields the caller leaves out.
#[derive(clap::Args, Clone, Debug)]
pub struct ServeOptions {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        value_enum,
        default_value_t = CliAllocationMethod::MeanVariance,
        help = "Allocation strategy used when a request does not pick one"
    )]
    pub allocator: CliAllocationMethod,
    #[arg(
        long,
        default_value_t = 100_000.0,
        help = "Default initial investment for projections and history"
    )]
    pub initial_investment: f64,
    #[arg(long, default_value_t = 10, help = "Default projection horizon in years")]
    pub horizon_years: u32,
    #[arg(long, default_value_t = 10, help = "Default historical window in years")]
    pub window_years: u32,
    #[arg(long, help = "Base URL of the external risk-assessment service")]
    pub oracle_url: Option<String>,
}

#[derive(Copy, Clone, Debug)]
struct Defaults {
    initial_investment: f64,
    horizon_years: u32,
    window_years: u32,
}

/// The keyed state store the engines publish to: the latest risk profile
/// and imported portfolio. Each write supersedes the previous value.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<SessionState>>,
}

#[derive(Default)]
struct SessionState {
    profile: Option<RiskProfile>,
    portfolio: Option<Portfolio>,
}

impl SessionStore {
    pub fn profile(&self) -> Option<RiskProfile> {
        self.inner.read().expect("session store lock").profile.clone()
    }

    pub fn portfolio(&self) -> Option<Portfolio> {
        self.inner.read().expect("session store lock").portfolio.clone()
    }

    pub fn set_profile(&self, profile: RiskProfile) {
        self.inner.write().expect("session store lock").profile = Some(profile);
    }

    pub fn set_portfolio(&self, portfolio: Portfolio) {
        self.inner.write().expect("session store lock").portfolio = Some(portfolio);
    }
}

#[derive(Clone)]
pub struct AppState {
    store: SessionStore,
    scorer: Arc<RiskScorer>,
    market: Arc<MarketConfig>,
    engine: Arc<AllocationEngine>,
    defaults: Defaults,
    oracle: Option<Arc<OracleClient>>,
}

impl AppState {
    pub fn new(options: &ServeOptions) -> Self {
        let market = MarketConfig::canonical();
        Self {
            store: SessionStore::default(),
            scorer: Arc::new(RiskScorer::canonical()),
            engine: Arc::new(AllocationEngine::new(
                market.clone(),
                options.allocator.into(),
            )),
            market: Arc::new(market),
            defaults: Defaults {
                initial_investment: options.initial_investment,
                horizon_years: options.horizon_years,
                window_years: options.window_years,
            },
            oracle: options
                .oracle_url
                .as_ref()
                .map(|url| Arc::new(OracleClient::new(url.clone()))),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MethodQuery {
    method: Option<ApiAllocationMethod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AllocatePayload {
    #[serde(alias = "risk_score")]
    risk_score: Option<f64>,
    method: Option<ApiAllocationMethod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RebalancePayload {
    allocation: Vec<AllocationSlice>,
    index: usize,
    value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionPayload {
    allocation: AppAllocation,
    initial_investment: Option<f64>,
    years: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPayload {
    allocation: AppAllocation,
    initial_investment: Option<f64>,
    window_years: Option<u32>,
    seed: Option<u64>,
    noise: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportPayload {
    assets: Vec<PortfolioAsset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RiskAssessmentQuery {
    risk_score: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    risk_score: f64,
    risk_band: RiskBand,
    allocation: AppAllocation,
    strategy: AllocationStrategy,
    method: ApiAllocationMethod,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RebalanceResponse {
    allocation: Vec<AllocationSlice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    initial_investment: f64,
    years: u32,
    series: Vec<ProjectionPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    initial_investment: f64,
    window_years: u32,
    annualized_return: f64,
    volatility: f64,
    max_drawdown: f64,
    series: Vec<HistoryPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportResponse {
    portfolio: Portfolio,
    allocation: AppAllocation,
    dropped_labels: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessResponse {
    risk_score: f64,
    message: String,
    fallback: bool,
    risk_band: RiskBand,
    allocation: AppAllocation,
    strategy: AllocationStrategy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    profile: Option<RiskProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioResponse {
    portfolio: Option<Portfolio>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(options: ServeOptions) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], options.port));
    if let Some(url) = &options.oracle_url {
        tracing::info!("using risk-assessment oracle at {url}");
    }
    let app = router(AppState::new(&options));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("robo HTTP API listening on http://{addr}");
    axum::serve(listener, app).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/score", post(score_handler))
        .route(
            "/api/allocate",
            get(allocate_get_handler).post(allocate_post_handler),
        )
        .route("/api/rebalance", post(rebalance_handler))
        .route("/api/projection", post(projection_handler))
        .route("/api/history", post(history_handler))
        .route("/api/import", post(import_handler))
        .route("/api/assess", post(assess_handler))
        .route("/api/profile", get(profile_handler))
        .route("/api/portfolio", get(portfolio_handler))
        .route("/api/risk-assessment", get(risk_assessment_handler))
        .route(
            "/api/portfolio-risk-assessment",
            post(portfolio_risk_assessment_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn score_handler(
    State(state): State<AppState>,
    Query(query): Query<MethodQuery>,
    Json(responses): Json<QuestionnaireResponse>,
) -> Response {
    let method = query
        .method
        .map(AllocationMethod::from)
        .unwrap_or_else(|| state.engine.method());

    let risk_score = match state.scorer.score(&responses) {
        Ok(score) => score,
        Err(err) => return core_error_response(&err),
    };
    let allocation = match state.engine.allocate_using(method, risk_score) {
        Ok(allocation) => allocation,
        Err(err) => return core_error_response(&err),
    };
    let strategy = AllocationStrategy::from_app(&allocation);
    let risk_band = RiskBand::for_score(risk_score);

    state.store.set_profile(RiskProfile {
        risk_score,
        risk_band,
        allocation,
        strategy,
        responses: Some(responses),
    });

    json_response(
        StatusCode::OK,
        ScoreResponse {
            risk_score,
            risk_band,
            allocation,
            strategy,
            method: method.into(),
        },
    )
}

async fn allocate_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<AllocatePayload>,
) -> Response {
    allocate_handler_impl(state, payload)
}

async fn allocate_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<AllocatePayload>,
) -> Response {
    allocate_handler_impl(state, payload)
}

fn allocate_handler_impl(state: AppState, payload: AllocatePayload) -> Response {
    let Some(risk_score) = payload.risk_score else {
        return error_response(StatusCode::BAD_REQUEST, "riskScore is required");
    };
    let method = payload
        .method
        .map(AllocationMethod::from)
        .unwrap_or_else(|| state.engine.method());

    let allocation = match state.engine.allocate_using(method, risk_score) {
        Ok(allocation) => allocation,
        Err(err) => return core_error_response(&err),
    };
    let strategy = AllocationStrategy::from_app(&allocation);
    let risk_band = RiskBand::for_score(risk_score);

    state.store.set_profile(RiskProfile {
        risk_score,
        risk_band,
        allocation,
        strategy,
        responses: None,
    });

    json_response(
        StatusCode::OK,
        ScoreResponse {
            risk_score,
            risk_band,
            allocation,
            strategy,
            method: method.into(),
        },
    )
}

async fn rebalance_handler(Json(payload): Json<RebalancePayload>) -> Response {
    match rebalance(&payload.allocation, payload.index, payload.value) {
        Ok(allocation) => json_response(StatusCode::OK, RebalanceResponse { allocation }),
        Err(err) => core_error_response(&err),
    }
}

async fn projection_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProjectionPayload>,
) -> Response {
    let initial_investment = payload
        .initial_investment
        .unwrap_or(state.defaults.initial_investment);
    let years = payload.years.unwrap_or(state.defaults.horizon_years);

    match project(
        &payload.allocation,
        &state.market.growth_rates,
        initial_investment,
        years,
    ) {
        Ok(series) => json_response(
            StatusCode::OK,
            ProjectionResponse {
                initial_investment,
                years,
                series,
            },
        ),
        Err(err) => core_error_response(&err),
    }
}

async fn history_handler(
    State(state): State<AppState>,
    Json(payload): Json<HistoryPayload>,
) -> Response {
    let initial_investment = payload
        .initial_investment
        .unwrap_or(state.defaults.initial_investment);
    let window_years = payload.window_years.unwrap_or(state.defaults.window_years);

    let simulator = if payload.noise.unwrap_or(true) {
        HistorySimulator::new(&state.market)
    } else {
        HistorySimulator::with_noise_span(&state.market, 0.0)
    };
    let result = match payload.seed {
        Some(seed) => simulator.simulate(
            &payload.allocation,
            initial_investment,
            window_years,
            &mut ChaCha20Rng::seed_from_u64(seed),
        ),
        None => simulator.simulate(
            &payload.allocation,
            initial_investment,
            window_years,
            &mut rand::rng(),
        ),
    };

    match result {
        Ok(series) => json_response(
            StatusCode::OK,
            HistoryResponse {
                initial_investment,
                window_years,
                annualized_return: annualized_return(&series),
                volatility: volatility(&series),
                max_drawdown: max_drawdown(initial_investment, &series),
                series,
            },
        ),
        Err(err) => core_error_response(&err),
    }
}

async fn import_handler(
    State(state): State<AppState>,
    Json(payload): Json<ImportPayload>,
) -> Response {
    let total_value: f64 = payload.assets.iter().map(|asset| asset.value).sum();
    let snapshot = PortfolioSnapshot {
        assets: payload.assets,
        total_value,
    };

    let (allocation, dropped_labels) = match allocation_from_snapshot(&snapshot) {
        Ok(result) => result,
        Err(err) => return core_error_response(&err),
    };

    let holdings = snapshot
        .assets
        .iter()
        .map(|asset| PortfolioHolding {
            asset_type: asset.asset_type.clone(),
            value: asset.value,
            percentage: if total_value > 0.0 {
                asset.value / total_value * 100.0
            } else {
                0.0
            },
        })
        .collect();
    let portfolio = Portfolio {
        assets: holdings,
        total_value,
    };
    state.store.set_portfolio(portfolio.clone());

    json_response(
        StatusCode::OK,
        ImportResponse {
            portfolio,
            allocation,
            dropped_labels,
        },
    )
}

/// Fetch a refreshed score from the oracle (when configured) and rebuild the
/// stored profile from it. On oracle failure the documented fallback score is
/// substituted and flagged; the flow never hard-fails on the oracle.
async fn assess_handler(State(state): State<AppState>) -> Response {
    let prior = state.store.profile().map(|profile| profile.risk_score);

    let (assessment, fallback) = match state.oracle.as_deref() {
        Some(client) => match client.risk_assessment(prior).await {
            Ok(assessment) => (assessment, false),
            Err(err) => {
                tracing::warn!("risk-assessment oracle failed: {err}");
                (fallback_assessment(&mut rand::rng()), true)
            }
        },
        None => (fallback_assessment(&mut rand::rng()), true),
    };

    let risk_score = assessment.risk_score.clamp(1.0, 10.0);
    let allocation = match state.engine.allocate(risk_score) {
        Ok(allocation) => allocation,
        Err(err) => return core_error_response(&err),
    };
    let strategy = AllocationStrategy::from_app(&allocation);
    let risk_band = RiskBand::for_score(risk_score);

    state.store.set_profile(RiskProfile {
        risk_score,
        risk_band,
        allocation,
        strategy,
        responses: None,
    });

    json_response(
        StatusCode::OK,
        AssessResponse {
            risk_score,
            message: assessment.message,
            fallback,
            risk_band,
            allocation,
            strategy,
        },
    )
}

async fn profile_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        ProfileResponse {
            profile: state.store.profile(),
        },
    )
}

async fn portfolio_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        PortfolioResponse {
            portfolio: state.store.portfolio(),
        },
    )
}

/// Serving side of the oracle contract: a uniform random score in [1, 10]
/// rounded to one decimal, as the original assessment service returns.
async fn risk_assessment_handler(Query(query): Query<RiskAssessmentQuery>) -> Response {
    tracing::debug!(prior = ?query.risk_score, "risk assessment requested");
    let risk_score: f64 = (rand::rng().random_range(1.0f64..=10.0) * 10.0).round() / 10.0;
    json_response(
        StatusCode::OK,
        Assessment {
            risk_score,
            message: "Risk assessment completed successfully".to_string(),
        },
    )
}

fn band_name(band: RiskBand) -> &'static str {
    match band {
        RiskBand::Conservative => "conservative",
        RiskBand::Moderate => "moderate",
        RiskBand::Aggressive => "aggressive",
    }
}

/// Deterministic counterpart for imported portfolios: the score is the
/// value-weighted riskiness of the composition.
async fn portfolio_risk_assessment_handler(
    Json(composition): Json<PortfolioComposition>,
) -> Response {
    if !composition.total_value.is_finite() || composition.total_value <= 0.0 {
        return error_response(StatusCode::BAD_REQUEST, "totalValue must be positive");
    }
    let scale = 100.0 / composition.total_value;
    let allocation = AppAllocation {
        stocks: composition.stocks * scale,
        gold: composition.gold * scale,
        fd: composition.fixed_deposit * scale,
        bonds: composition.bonds * scale,
        mutual_funds: composition.mutual_funds * scale,
    };

    let risk_score = match composition_risk_score(&allocation) {
        Ok(score) => (score * 10.0).round() / 10.0,
        Err(err) => return core_error_response(&err),
    };
    let band = band_name(RiskBand::for_score(risk_score));

    json_response(
        StatusCode::OK,
        Assessment {
            risk_score,
            message: format!("Portfolio composition implies a {band} risk profile"),
        },
    )
}

fn core_error_response(err: &CoreError) -> Response {
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

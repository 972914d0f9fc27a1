mod allocation;
mod error;
mod history;
mod scoring;
mod tables;
mod types;

pub use allocation::{
    AllocationEngine, AllocationMethod, Optimizer, ProjectedGradientDescent,
    allocation_from_snapshot, rebalance,
};
pub use error::CoreError;
pub use history::{
    DEFAULT_NOISE_SPAN, HistorySimulator, annualized_return, max_drawdown, project, volatility,
};
pub use scoring::{RiskScorer, composition_risk_score};
pub use tables::{
    FactorWeights, GrowthRates, MarketConfig, MonthlyReturn, PointTable, ScoringConfig,
};
pub use types::{
    ASSET_COUNT, AllocationSlice, AllocationStrategy, AppAllocation, AssetKey, BONDS, CASH,
    EQUITY, GOLD, HistoryPoint, Portfolio, PortfolioAsset, PortfolioHolding, PortfolioSnapshot,
    ProjectionPoint, QuestionnaireResponse, REAL_ESTATE, RiskBand, RiskProfile,
};

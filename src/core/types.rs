use serde::{Deserialize, Serialize};

use super::error::CoreError;

/// Number of asset classes the optimizer works over.
/// Optimizer vector order: bonds, cash/FD, gold, equities, real estate.
pub const ASSET_COUNT: usize = 5;

pub const BONDS: usize = 0;
pub const CASH: usize = 1;
pub const GOLD: usize = 2;
pub const EQUITY: usize = 3;
pub const REAL_ESTATE: usize = 4;

/// One completed questionnaire. Nine single-choice answers plus the two
/// multi-select questions (`loans`, `investment_interests`), which may be
/// empty. Answer values are free strings validated against the scoring
/// tables at scoring time; `primary_goal` alone tolerates unknown values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireResponse {
    pub age_group: String,
    pub monthly_income: String,
    pub savings_percentage: String,
    #[serde(default)]
    pub loans: Vec<String>,
    pub investment_experience: String,
    pub risk_tolerance: String,
    pub market_drop_reaction: String,
    #[serde(default)]
    pub investment_interests: Vec<String>,
    pub primary_goal: String,
    pub time_horizon: String,
    pub emergency_fund: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskBand {
    /// Band thresholds: conservative up to 3, moderate up to 6, aggressive above.
    pub fn for_score(score: f64) -> Self {
        if score <= 3.0 {
            RiskBand::Conservative
        } else if score <= 6.0 {
            RiskBand::Moderate
        } else {
            RiskBand::Aggressive
        }
    }
}

/// Application-facing allocation: percentages over the five asset buckets
/// the front end works with. Must sum to 100 within 0.1; violations are
/// renormalized proportionally, never left as-is.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppAllocation {
    pub stocks: f64,
    pub gold: f64,
    pub fd: f64,
    pub bonds: f64,
    pub mutual_funds: f64,
}

impl AppAllocation {
    pub fn as_array(&self) -> [f64; ASSET_COUNT] {
        [self.stocks, self.gold, self.fd, self.bonds, self.mutual_funds]
    }

    pub fn from_array(values: [f64; ASSET_COUNT]) -> Self {
        Self {
            stocks: values[0],
            gold: values[1],
            fd: values[2],
            bonds: values[3],
            mutual_funds: values[4],
        }
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.total() - 100.0).abs() <= 0.1
    }

    /// Scale every slice so the total is exactly 100.
    pub fn renormalized(&self) -> Result<Self, CoreError> {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(CoreError::InputOutOfRange(format!(
                "allocation total must be positive, got {total}"
            )));
        }
        if self.as_array().iter().any(|v| *v < 0.0) {
            return Err(CoreError::InputOutOfRange(
                "allocation slices must be non-negative".to_string(),
            ));
        }
        let scale = 100.0 / total;
        Ok(Self::from_array(self.as_array().map(|v| v * scale)))
    }
}

/// Profile-facing allocation over the published asset-class names.
/// `equities` carries stocks + mutual funds; real estate is folded away by
/// the application mapping and reported as zero.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationStrategy {
    pub equities: f64,
    pub bonds: f64,
    pub commodities: f64,
    pub real_estate: f64,
    pub cash: f64,
}

impl AllocationStrategy {
    pub fn from_app(allocation: &AppAllocation) -> Self {
        Self {
            equities: allocation.stocks + allocation.mutual_funds,
            bonds: allocation.bonds,
            commodities: allocation.gold,
            real_estate: 0.0,
            cash: allocation.fd,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKey {
    Stocks,
    Gold,
    Fd,
    Bonds,
    MutualFunds,
}

/// One adjustable slice of the interactive allocation editor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub key: AssetKey,
    pub value: f64,
}

/// Raw imported holding: a free-form asset-type label and its value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAsset {
    #[serde(rename = "type")]
    pub asset_type: String,
    pub value: f64,
}

/// Read-only snapshot produced by the import collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub assets: Vec<PortfolioAsset>,
    pub total_value: f64,
}

/// A stored holding with its share of the imported total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioHolding {
    #[serde(rename = "type")]
    pub asset_type: String,
    pub value: f64,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub assets: Vec<PortfolioHolding>,
    pub total_value: f64,
}

/// Result of a scoring or optimization pass, published to the state store.
/// Superseded wholesale on every recalculation, never mutated in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub risk_score: f64,
    pub risk_band: RiskBand,
    pub allocation: AppAllocation,
    pub strategy: AllocationStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<QuestionnaireResponse>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub year: u32,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub month: String,
    pub value: f64,
    pub change_percentage: f64,
}

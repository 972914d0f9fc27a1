//! Canonical scoring and market-assumption tables.
//!
//! Both configs are built once with `canonical()` and handed to the engines
//! at construction; nothing in here is mutated at runtime. Point values live
//! in [1, 5] and the factor weights sum to 1.0, which is what keeps the raw
//! weighted score inside [1, 5] before normalization.

use super::types::{ASSET_COUNT, RiskBand};

pub type PointTable = &'static [(&'static str, f64)];

/// Per-question weights in the raw score. Must sum to 1.0.
#[derive(Clone, Copy, Debug)]
pub struct FactorWeights {
    pub age_group: f64,
    pub monthly_income: f64,
    pub savings_percentage: f64,
    pub loans: f64,
    pub investment_experience: f64,
    pub risk_tolerance: f64,
    pub market_drop_reaction: f64,
    pub investment_interests: f64,
    pub primary_goal: f64,
    pub time_horizon: f64,
    pub emergency_fund: f64,
}

impl FactorWeights {
    pub fn sum(&self) -> f64 {
        self.age_group
            + self.monthly_income
            + self.savings_percentage
            + self.loans
            + self.investment_experience
            + self.risk_tolerance
            + self.market_drop_reaction
            + self.investment_interests
            + self.primary_goal
            + self.time_horizon
            + self.emergency_fund
    }
}

/// Static questionnaire scoring tables.
#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub weights: FactorWeights,
    pub age_group: PointTable,
    pub monthly_income: PointTable,
    pub savings_percentage: PointTable,
    pub investment_experience: PointTable,
    pub risk_tolerance: PointTable,
    pub market_drop_reaction: PointTable,
    pub time_horizon: PointTable,
    pub emergency_fund: PointTable,
    pub goal_scores: PointTable,
    /// Used when `primary_goal` is not in `goal_scores`; goal vocabulary may
    /// legitimately vary by deployment, so unknown goals are not an error.
    pub goal_default: f64,
    /// Interests that count toward the risk-seeking interest score.
    pub risky_interests: &'static [&'static str],
}

impl ScoringConfig {
    pub fn canonical() -> Self {
        ScoringConfig {
            weights: FactorWeights {
                age_group: 0.10,
                monthly_income: 0.10,
                savings_percentage: 0.10,
                loans: 0.05,
                investment_experience: 0.15,
                risk_tolerance: 0.15,
                market_drop_reaction: 0.15,
                investment_interests: 0.05,
                primary_goal: 0.05,
                time_horizon: 0.05,
                emergency_fund: 0.05,
            },
            age_group: &[
                ("18-25", 5.0),
                ("26-35", 4.0),
                ("36-45", 3.0),
                ("46-60", 2.0),
                ("60+", 1.0),
            ],
            monthly_income: &[
                ("Below ₹30,000", 1.0),
                ("₹30,000 - ₹50,000", 2.0),
                ("₹50,000 - ₹1,00,000", 3.0),
                ("₹1,00,000 - ₹2,00,000", 4.0),
                ("Above ₹2,00,000", 5.0),
            ],
            savings_percentage: &[
                ("Less than 10%", 1.0),
                ("10% - 20%", 2.0),
                ("20% - 30%", 3.0),
                ("30% - 50%", 4.0),
                ("More than 50%", 5.0),
            ],
            investment_experience: &[
                ("Beginner", 1.0),
                ("Intermediate", 3.0),
                ("Advanced", 5.0),
            ],
            risk_tolerance: &[("Low", 1.0), ("Medium", 3.0), ("High", 5.0)],
            market_drop_reaction: &[
                ("Sell everything to prevent further loss", 1.0),
                ("Do nothing and wait for recovery", 3.0),
                ("Invest more to buy at lower prices", 5.0),
            ],
            time_horizon: &[
                ("Less than 1 year", 1.0),
                ("1-3 years", 2.0),
                ("3-5 years", 3.0),
                ("5+ years", 5.0),
            ],
            emergency_fund: &[
                ("Yes, covering 6+ months of expenses", 5.0),
                ("Yes, covering 3-6 months of expenses", 3.0),
                ("No, I do not have an emergency fund", 1.0),
            ],
            goal_scores: &[
                ("Wealth accumulation", 5.0),
                ("Saving for retirement", 3.0),
                ("Buying a house", 3.0),
                ("Generating passive income", 4.0),
                ("Saving for education", 3.0),
            ],
            goal_default: 3.0,
            risky_interests: &["Stocks", "Mutual Funds", "Real Estate"],
        }
    }
}

/// Annual growth assumptions for the application asset buckets.
#[derive(Clone, Copy, Debug)]
pub struct GrowthRates {
    pub stocks: f64,
    pub gold: f64,
    pub fd: f64,
    pub bonds: f64,
    pub mutual_funds: f64,
}

/// One month of per-asset historical returns, in percent.
#[derive(Clone, Copy, Debug)]
pub struct MonthlyReturn {
    pub stocks: f64,
    pub gold: f64,
    pub fixed_deposits: f64,
    pub bonds: f64,
    pub mutual_funds: f64,
}

/// Market assumptions for the optimizer and the projection/history engines.
/// Optimizer-order vectors and matrices: bonds, cash, gold, equity, real estate.
#[derive(Clone, Debug)]
pub struct MarketConfig {
    pub expected_returns: [f64; ASSET_COUNT],
    pub covariance: [[f64; ASSET_COUNT]; ASSET_COUNT],
    pub conservative_bounds: [(f64, f64); ASSET_COUNT],
    pub moderate_bounds: [(f64, f64); ASSET_COUNT],
    pub aggressive_bounds: [(f64, f64); ASSET_COUNT],
    pub conservative_default: [f64; ASSET_COUNT],
    pub moderate_default: [f64; ASSET_COUNT],
    pub aggressive_default: [f64; ASSET_COUNT],
    pub growth_rates: GrowthRates,
    /// Baseline monthly return table, repeated cyclically (with noise) to
    /// fill longer windows.
    pub monthly_history: &'static [MonthlyReturn],
    /// Calendar position of the first baseline month: (year, zero-based month).
    pub history_start: (i32, usize),
}

impl MarketConfig {
    pub fn canonical() -> Self {
        MarketConfig {
            expected_returns: [0.07, 0.03, 0.08, 0.12, 0.10],
            covariance: [
                [0.0004, 0.0001, 0.0002, 0.0003, 0.0002],
                [0.0001, 0.0001, 0.0001, 0.0001, 0.0001],
                [0.0002, 0.0001, 0.0009, 0.0005, 0.0003],
                [0.0003, 0.0001, 0.0005, 0.0016, 0.0007],
                [0.0002, 0.0001, 0.0003, 0.0007, 0.0010],
            ],
            conservative_bounds: [
                (0.20, 0.40),
                (0.20, 0.40),
                (0.05, 0.15),
                (0.10, 0.25),
                (0.00, 0.10),
            ],
            moderate_bounds: [
                (0.15, 0.30),
                (0.10, 0.25),
                (0.05, 0.15),
                (0.30, 0.50),
                (0.05, 0.15),
            ],
            aggressive_bounds: [
                (0.05, 0.15),
                (0.05, 0.15),
                (0.00, 0.10),
                (0.50, 0.75),
                (0.10, 0.20),
            ],
            conservative_default: [0.30, 0.30, 0.10, 0.20, 0.10],
            moderate_default: [0.20, 0.15, 0.10, 0.40, 0.15],
            aggressive_default: [0.10, 0.05, 0.05, 0.65, 0.15],
            growth_rates: GrowthRates {
                stocks: 0.12,
                gold: 0.08,
                fd: 0.06,
                bonds: 0.07,
                mutual_funds: 0.10,
            },
            monthly_history: BASELINE_MONTHLY_HISTORY,
            history_start: (2015, 2), // Mar 2015
        }
    }

    pub fn bounds_for(&self, band: RiskBand) -> [(f64, f64); ASSET_COUNT] {
        match band {
            RiskBand::Conservative => self.conservative_bounds,
            RiskBand::Moderate => self.moderate_bounds,
            RiskBand::Aggressive => self.aggressive_bounds,
        }
    }

    pub fn default_allocation_for(&self, band: RiskBand) -> [f64; ASSET_COUNT] {
        match band {
            RiskBand::Conservative => self.conservative_default,
            RiskBand::Moderate => self.moderate_default,
            RiskBand::Aggressive => self.aggressive_default,
        }
    }
}

/// Mar 2015 – Feb 2017 monthly returns in percent.
const BASELINE_MONTHLY_HISTORY: &[MonthlyReturn] = &[
    MonthlyReturn { stocks: -1.254599, gold: 1.844641, fixed_deposits: 0.970229, bonds: 0.704621, mutual_funds: 2.293986 },
    MonthlyReturn { stocks: 4.507143, gold: 2.376548, fixed_deposits: 0.976964, bonds: 1.036275, mutual_funds: 2.957487 },
    MonthlyReturn { stocks: 2.319939, gold: -1.091979, fixed_deposits: 0.957432, bonds: 0.795729, mutual_funds: 0.545411 },
    MonthlyReturn { stocks: 0.28635, gold: -1.940611, fixed_deposits: 0.825148, bonds: 1.008992, mutual_funds: -3.747043 },
    MonthlyReturn { stocks: -2.663061, gold: 1.871288, fixed_deposits: 0.751267, bonds: 0.670156, mutual_funds: 4.486158 },
    MonthlyReturn { stocks: -2.35693, gold: 1.330488, fixed_deposits: 0.830827, bonds: 0.863803, mutual_funds: 1.320501 },
    MonthlyReturn { stocks: -0.469987, gold: -2.359235, fixed_deposits: 0.777652, bonds: 0.974952, mutual_funds: 1.221418 },
    MonthlyReturn { stocks: 2.030264, gold: -1.027689, fixed_deposits: 0.887855, bonds: 1.038549, mutual_funds: 3.62461 },
    MonthlyReturn { stocks: -1.205079, gold: 2.658356, fixed_deposits: 0.730676, bonds: 0.898654, mutual_funds: 2.492328 },
    MonthlyReturn { stocks: 3.462879, gold: -2.63616, fixed_deposits: 0.953663, bonds: 0.950862, mutual_funds: 1.044724 },
    MonthlyReturn { stocks: -1.724918, gold: 2.292699, fixed_deposits: 0.829642, bonds: 0.993076, mutual_funds: 5.740524 },
    MonthlyReturn { stocks: 3.866626, gold: 1.362823, fixed_deposits: 0.857922, bonds: 0.956205, mutual_funds: 0.121432 },
    MonthlyReturn { stocks: 0.275437, gold: 1.932538, fixed_deposits: 0.816887, bonds: 0.943748, mutual_funds: 2.828461 },
    MonthlyReturn { stocks: 1.166105, gold: -0.326021, fixed_deposits: 0.84532, bonds: 0.99698, mutual_funds: 5.886726 },
    MonthlyReturn { stocks: -1.636379, gold: -0.639604, fixed_deposits: 0.679702, bonds: 0.995966, mutual_funds: 2.930007 },
    MonthlyReturn { stocks: 4.839209, gold: -1.166921, fixed_deposits: 0.810955, bonds: 0.766192, mutual_funds: 1.146165 },
    MonthlyReturn { stocks: -2.796955, gold: 2.523755, fixed_deposits: 0.94574, bonds: 0.921443, mutual_funds: -1.456357 },
    MonthlyReturn { stocks: 2.143908, gold: -1.340722, fixed_deposits: 0.930909, bonds: 1.032542, mutual_funds: 0.211883 },
    MonthlyReturn { stocks: -2.185136, gold: 2.292481, fixed_deposits: 0.928635, bonds: 0.975068, mutual_funds: 1.214766 },
    MonthlyReturn { stocks: 2.99336, gold: -2.005785, fixed_deposits: 0.947915, bonds: 0.860738, mutual_funds: 1.117396 },
    MonthlyReturn { stocks: -2.021374, gold: 0.301254, fixed_deposits: 0.897125, bonds: 0.976496, mutual_funds: 3.518898 },
    MonthlyReturn { stocks: 1.861629, gold: -1.390214, fixed_deposits: 0.876806, bonds: 1.146526, mutual_funds: 4.968281 },
    MonthlyReturn { stocks: -0.339325, gold: -1.171655, fixed_deposits: 0.9738, bonds: 0.842257, mutual_funds: 1.711669 },
    MonthlyReturn { stocks: 4.608969, gold: -0.189291, fixed_deposits: 0.731222, bonds: 1.121432, mutual_funds: 2.548821 },
];

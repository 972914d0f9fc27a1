//! Allocation Optimizer: risk score to a five-asset allocation.
//!
//! Two strategies ship behind one interface and are never merged:
//! a discrete risk-band lookup with linear interpolation between band
//! anchors, and constrained variance minimization over the market
//! covariance matrix. Both produce the application-facing allocation via
//! the same equity split and renormalization pipeline.

use super::error::CoreError;
use super::tables::MarketConfig;
use super::types::{
    ASSET_COUNT, AllocationSlice, AppAllocation, AssetKey, BONDS, CASH, EQUITY, GOLD,
    PortfolioSnapshot, RiskBand,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AllocationMethod {
    BandLookup,
    MeanVariance,
}

/// Numeric minimizer seam: minimize `objective` over the simplex
/// (weights sum to 1) subject to per-asset bounds. Implementations return
/// a feasible weight vector or an `Optimization` error; the caller decides
/// the fallback.
pub trait Optimizer {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64; ASSET_COUNT]) -> f64,
        bounds: &[(f64, f64); ASSET_COUNT],
    ) -> Result<[f64; ASSET_COUNT], CoreError>;
}

/// Fixed-iteration projected gradient descent: renormalize onto the
/// simplex, clamp into bounds, step against a central-difference gradient,
/// repeat.
pub struct ProjectedGradientDescent {
    pub iterations: u32,
    pub learning_rate: f64,
    pub gradient_step: f64,
}

impl Default for ProjectedGradientDescent {
    fn default() -> Self {
        Self {
            iterations: 1000,
            learning_rate: 0.01,
            gradient_step: 1e-4,
        }
    }
}

impl Optimizer for ProjectedGradientDescent {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64; ASSET_COUNT]) -> f64,
        bounds: &[(f64, f64); ASSET_COUNT],
    ) -> Result<[f64; ASSET_COUNT], CoreError> {
        let mut weights = [1.0 / ASSET_COUNT as f64; ASSET_COUNT];

        for _ in 0..self.iterations {
            project(&mut weights, bounds)?;

            let mut gradient = [0.0; ASSET_COUNT];
            for j in 0..ASSET_COUNT {
                let mut upper = weights;
                upper[j] += self.gradient_step;
                let mut lower = weights;
                lower[j] -= self.gradient_step;
                gradient[j] = (objective(&upper) - objective(&lower)) / (2.0 * self.gradient_step);
            }

            for j in 0..ASSET_COUNT {
                weights[j] -= self.learning_rate * gradient[j];
            }
        }

        project(&mut weights, bounds)?;
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(CoreError::Optimization(
                "gradient descent produced non-finite weights".to_string(),
            ));
        }
        Ok(weights)
    }
}

/// Renormalize to sum 1, then clamp into bounds.
fn project(
    weights: &mut [f64; ASSET_COUNT],
    bounds: &[(f64, f64); ASSET_COUNT],
) -> Result<(), CoreError> {
    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() || sum.abs() < 1e-9 {
        return Err(CoreError::Optimization(format!(
            "weights degenerated to sum {sum}"
        )));
    }
    for (weight, (lower, upper)) in weights.iter_mut().zip(bounds) {
        *weight = (*weight / sum).clamp(*lower, *upper);
    }
    Ok(())
}

fn portfolio_variance(
    weights: &[f64; ASSET_COUNT],
    covariance: &[[f64; ASSET_COUNT]; ASSET_COUNT],
) -> f64 {
    let mut total = 0.0;
    for i in 0..ASSET_COUNT {
        for j in 0..ASSET_COUNT {
            total += weights[i] * covariance[i][j] * weights[j];
        }
    }
    total
}

pub struct AllocationEngine {
    market: MarketConfig,
    method: AllocationMethod,
    optimizer: Box<dyn Optimizer + Send + Sync>,
}

impl AllocationEngine {
    pub fn new(market: MarketConfig, method: AllocationMethod) -> Self {
        Self::with_optimizer(market, method, Box::new(ProjectedGradientDescent::default()))
    }

    pub fn with_optimizer(
        market: MarketConfig,
        method: AllocationMethod,
        optimizer: Box<dyn Optimizer + Send + Sync>,
    ) -> Self {
        Self {
            market,
            method,
            optimizer,
        }
    }

    pub fn method(&self) -> AllocationMethod {
        self.method
    }

    pub fn allocate(&self, risk_score: f64) -> Result<AppAllocation, CoreError> {
        self.allocate_using(self.method, risk_score)
    }

    pub fn allocate_using(
        &self,
        method: AllocationMethod,
        risk_score: f64,
    ) -> Result<AppAllocation, CoreError> {
        if !risk_score.is_finite() || !(1.0..=10.0).contains(&risk_score) {
            return Err(CoreError::InputOutOfRange(format!(
                "risk score must be within [1, 10], got {risk_score}"
            )));
        }
        let weights = match method {
            AllocationMethod::BandLookup => self.band_lookup(risk_score),
            AllocationMethod::MeanVariance => self.mean_variance(risk_score),
        };
        Ok(to_app_allocation(weights))
    }

    /// Piecewise-linear interpolation between band anchor tuples. Anchors
    /// sit at the band ceilings (3, 6, 10) so a score exactly on a band
    /// boundary resolves to that band's defining tuple with no
    /// discontinuity.
    fn band_lookup(&self, risk_score: f64) -> [f64; ASSET_COUNT] {
        let conservative = self.market.conservative_default;
        let moderate = self.market.moderate_default;
        let aggressive = self.market.aggressive_default;

        if risk_score <= 3.0 {
            conservative
        } else if risk_score <= 6.0 {
            lerp(conservative, moderate, (risk_score - 3.0) / 3.0)
        } else {
            lerp(moderate, aggressive, (risk_score - 6.0) / 4.0)
        }
    }

    /// Minimize portfolio variance within the band's bounds. Any failure or
    /// infeasible result falls back to the band's default allocation and is
    /// never surfaced to the caller.
    fn mean_variance(&self, risk_score: f64) -> [f64; ASSET_COUNT] {
        let band = RiskBand::for_score(risk_score);
        let bounds = self.market.bounds_for(band);
        let covariance = self.market.covariance;
        let objective = move |weights: &[f64; ASSET_COUNT]| portfolio_variance(weights, &covariance);

        match self.optimizer.minimize(&objective, &bounds) {
            Ok(solution) => finish_solution(solution, &bounds)
                .unwrap_or_else(|| self.market.default_allocation_for(band)),
            Err(_) => self.market.default_allocation_for(band),
        }
    }
}

fn lerp(
    from: [f64; ASSET_COUNT],
    to: [f64; ASSET_COUNT],
    factor: f64,
) -> [f64; ASSET_COUNT] {
    let mut out = [0.0; ASSET_COUNT];
    for i in 0..ASSET_COUNT {
        out[i] = from[i] + (to[i] - from[i]) * factor;
    }
    out
}

/// Round the solver output to 2 decimals, spread the residual equally, and
/// reclamp into bounds. Returns `None` when the result is not a usable
/// simplex point, triggering the default-allocation fallback.
fn finish_solution(
    mut weights: [f64; ASSET_COUNT],
    bounds: &[(f64, f64); ASSET_COUNT],
) -> Option<[f64; ASSET_COUNT]> {
    for weight in &mut weights {
        *weight = (*weight * 100.0).round() / 100.0;
    }
    let residual = 1.0 - weights.iter().sum::<f64>();
    let share = residual / ASSET_COUNT as f64;
    for (weight, (lower, upper)) in weights.iter_mut().zip(bounds) {
        *weight = (*weight + share).clamp(*lower, *upper);
    }

    let sum: f64 = weights.iter().sum();
    if weights.iter().all(|w| w.is_finite()) && (sum - 1.0).abs() <= 0.05 {
        Some(weights)
    } else {
        None
    }
}

/// Map an optimizer-order weight vector (fractions) onto the application
/// buckets: equity splits 75/25 into stocks/mutual funds, real estate is
/// folded away, and the result is renormalized to exactly 100 then rounded
/// to one decimal with the residual absorbed by the largest slice.
fn to_app_allocation(weights: [f64; ASSET_COUNT]) -> AppAllocation {
    let values = [
        weights[EQUITY] * 75.0,
        weights[GOLD] * 100.0,
        weights[CASH] * 100.0,
        weights[BONDS] * 100.0,
        weights[EQUITY] * 25.0,
    ];
    AppAllocation::from_array(round_to_hundred(values))
}

/// Scale to sum 100, round each slice to one decimal, and absorb the
/// rounding residual (a multiple of 0.1) into the largest slice so the
/// total is exactly 100.
fn round_to_hundred(mut values: [f64; ASSET_COUNT]) -> [f64; ASSET_COUNT] {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for value in &mut values {
            *value *= 100.0 / total;
        }
    }
    for value in &mut values {
        *value = round1(*value);
    }
    let residual = 100.0 - values.iter().sum::<f64>();
    if residual.abs() > 1e-9 {
        let largest = values
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);
        values[largest] = round1(values[largest] + residual);
    }
    values
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Interactive rebalancing: set slice `index` to `new_value`, take the
/// difference proportionally out of the other slices (clamped at zero),
/// then renormalize the whole set to exactly 100 at one-decimal precision.
pub fn rebalance(
    slices: &[AllocationSlice],
    index: usize,
    new_value: f64,
) -> Result<Vec<AllocationSlice>, CoreError> {
    if slices.is_empty() {
        return Err(CoreError::InputOutOfRange(
            "allocation has no slices".to_string(),
        ));
    }
    if index >= slices.len() {
        return Err(CoreError::InputOutOfRange(format!(
            "slice index {index} out of bounds for {} slices",
            slices.len()
        )));
    }
    if !new_value.is_finite() || !(0.0..=100.0).contains(&new_value) {
        return Err(CoreError::InputOutOfRange(format!(
            "slice value must be within [0, 100], got {new_value}"
        )));
    }

    let mut out = slices.to_vec();
    let difference = new_value - out[index].value;
    let other_total: f64 = out
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, slice)| slice.value)
        .sum();

    for (i, slice) in out.iter_mut().enumerate() {
        if i == index {
            slice.value = new_value;
        } else if other_total > 0.0 {
            slice.value = (slice.value - difference * slice.value / other_total).max(0.0);
        }
    }

    let total: f64 = out.iter().map(|slice| slice.value).sum();
    if total <= 0.0 {
        return Err(CoreError::InputOutOfRange(
            "rebalanced allocation sums to zero".to_string(),
        ));
    }
    let scale = 100.0 / total;
    for slice in &mut out {
        slice.value = round1(slice.value * scale);
    }
    let residual = 100.0 - out.iter().map(|slice| slice.value).sum::<f64>();
    if residual.abs() > 1e-9 {
        let largest = out
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.value.total_cmp(&b.value))
            .map(|(i, _)| i)
            .unwrap_or(0);
        out[largest].value = round1(out[largest].value + residual);
    }
    Ok(out)
}

/// Asset-type labels accepted by the import mapping. Unrecognized labels
/// are dropped, not bucketed; the returned list names what was dropped so
/// callers can surface the undercount.
fn parse_asset_key(label: &str) -> Option<AssetKey> {
    match label.trim().to_lowercase().as_str() {
        "stocks" | "stock" | "equity" | "equities" => Some(AssetKey::Stocks),
        "gold" => Some(AssetKey::Gold),
        "fd" | "fixed deposit" | "fixed deposits" => Some(AssetKey::Fd),
        "bonds" | "bond" => Some(AssetKey::Bonds),
        "mutual funds" | "mutual fund" | "mutualfunds" | "mf" => Some(AssetKey::MutualFunds),
        _ => None,
    }
}

/// Derive an allocation from an imported snapshot: percentage per class is
/// the class value over the recognized total. Returns the allocation plus
/// the labels that were dropped.
pub fn allocation_from_snapshot(
    snapshot: &PortfolioSnapshot,
) -> Result<(AppAllocation, Vec<String>), CoreError> {
    if snapshot.assets.is_empty() {
        return Err(CoreError::InputOutOfRange(
            "portfolio snapshot has no assets".to_string(),
        ));
    }

    let mut values = [0.0_f64; ASSET_COUNT]; // app order
    let mut dropped = Vec::new();
    for asset in &snapshot.assets {
        if !asset.value.is_finite() || asset.value < 0.0 {
            return Err(CoreError::InputOutOfRange(format!(
                "asset {:?} has invalid value {}",
                asset.asset_type, asset.value
            )));
        }
        match parse_asset_key(&asset.asset_type) {
            Some(AssetKey::Stocks) => values[0] += asset.value,
            Some(AssetKey::Gold) => values[1] += asset.value,
            Some(AssetKey::Fd) => values[2] += asset.value,
            Some(AssetKey::Bonds) => values[3] += asset.value,
            Some(AssetKey::MutualFunds) => values[4] += asset.value,
            None => dropped.push(asset.asset_type.clone()),
        }
    }

    let recognized: f64 = values.iter().sum();
    if recognized <= 0.0 {
        return Err(CoreError::InputOutOfRange(
            "no recognized asset classes in snapshot".to_string(),
        ));
    }
    let allocation =
        AppAllocation::from_array(values.map(|value| value / recognized * 100.0)).renormalized()?;
    Ok((allocation, dropped))
}

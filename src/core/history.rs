//! Projection/Performance Engine: forward growth projections and the
//! simulated historical return series with its summary metrics.

use rand::Rng;

use super::error::CoreError;
use super::tables::{GrowthRates, MarketConfig, MonthlyReturn};
use super::types::{AppAllocation, HistoryPoint, ProjectionPoint};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Uniform noise span, in percentage points, applied when extending the
/// baseline table past its 24 recorded months.
pub const DEFAULT_NOISE_SPAN: f64 = 3.0;

/// Deterministic forward projection: each slice compounds at its own annual
/// rate and the slices are summed, so this is not a blended single rate.
/// Year 0 is the initial investment with no growth applied.
pub fn project(
    allocation: &AppAllocation,
    growth: &GrowthRates,
    initial_investment: f64,
    horizon_years: u32,
) -> Result<Vec<ProjectionPoint>, CoreError> {
    if !initial_investment.is_finite() || initial_investment < 0.0 {
        return Err(CoreError::InputOutOfRange(format!(
            "initial investment must be non-negative, got {initial_investment}"
        )));
    }
    let allocation = allocation.renormalized()?;

    let slices = [
        (allocation.stocks, growth.stocks),
        (allocation.gold, growth.gold),
        (allocation.fd, growth.fd),
        (allocation.bonds, growth.bonds),
        (allocation.mutual_funds, growth.mutual_funds),
    ];

    let mut series = Vec::with_capacity(horizon_years as usize + 1);
    for year in 0..=horizon_years {
        let mut value = initial_investment;
        for (percentage, rate) in slices {
            let amount = initial_investment * percentage / 100.0;
            value += amount * ((1.0 + rate).powi(year as i32) - 1.0);
        }
        series.push(ProjectionPoint { year, value });
    }
    Ok(series)
}

/// Walks the baseline monthly-return table, cyclically repeated and
/// perturbed with bounded uniform noise beyond the recorded months, and
/// compounds the allocation-weighted return into a cumulative value series.
pub struct HistorySimulator<'a> {
    market: &'a MarketConfig,
    noise_span: f64,
}

impl<'a> HistorySimulator<'a> {
    pub fn new(market: &'a MarketConfig) -> Self {
        Self {
            market,
            noise_span: DEFAULT_NOISE_SPAN,
        }
    }

    /// A span of 0.0 disables the noise entirely, making the extension an
    /// exact cyclic repeat of the baseline.
    pub fn with_noise_span(market: &'a MarketConfig, noise_span: f64) -> Self {
        Self { market, noise_span }
    }

    pub fn simulate(
        &self,
        allocation: &AppAllocation,
        initial_investment: f64,
        window_years: u32,
        rng: &mut impl Rng,
    ) -> Result<Vec<HistoryPoint>, CoreError> {
        if !initial_investment.is_finite() || initial_investment < 0.0 {
            return Err(CoreError::InputOutOfRange(format!(
                "initial investment must be non-negative, got {initial_investment}"
            )));
        }
        if window_years == 0 {
            return Err(CoreError::InputOutOfRange(
                "historical window must cover at least one year".to_string(),
            ));
        }
        let allocation = allocation.renormalized()?;

        let baseline = self.market.monthly_history;
        let months = window_years as usize * 12;
        let mut series = Vec::with_capacity(months);
        let mut cumulative = initial_investment;
        let mut previous = initial_investment;

        for i in 0..months {
            let row = if i < baseline.len() {
                baseline[i]
            } else {
                self.perturbed(baseline[(i - baseline.len()) % baseline.len()], rng)
            };

            let monthly_return = allocation.stocks / 100.0 * row.stocks
                + allocation.gold / 100.0 * row.gold
                + allocation.fd / 100.0 * row.fixed_deposits
                + allocation.bonds / 100.0 * row.bonds
                + allocation.mutual_funds / 100.0 * row.mutual_funds;

            cumulative *= 1.0 + monthly_return / 100.0;
            let change_percentage = if previous > 0.0 {
                (cumulative - previous) / previous * 100.0
            } else {
                0.0
            };
            previous = cumulative;

            series.push(HistoryPoint {
                month: self.month_label(i),
                value: cumulative,
                change_percentage,
            });
        }
        Ok(series)
    }

    fn perturbed(&self, source: MonthlyReturn, rng: &mut impl Rng) -> MonthlyReturn {
        let mut variation = || (rng.random::<f64>() - 0.5) * self.noise_span;
        // FD and bond columns get damped noise and stay positive.
        MonthlyReturn {
            stocks: source.stocks + variation(),
            gold: source.gold + variation(),
            fixed_deposits: (source.fixed_deposits + variation() * 0.1).abs(),
            bonds: (source.bonds + variation() * 0.2).abs(),
            mutual_funds: source.mutual_funds + variation(),
        }
    }

    fn month_label(&self, offset: usize) -> String {
        let (start_year, start_month) = self.market.history_start;
        let index = start_month + offset;
        format!(
            "{} {}",
            MONTH_NAMES[index % 12],
            start_year + (index / 12) as i32
        )
    }
}

/// Compound annual growth over the series: (last/first)^(1/years) − 1, in
/// percent. Assumes monthly spacing.
pub fn annualized_return(series: &[HistoryPoint]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let first = series[0].value;
    let last = series[series.len() - 1].value;
    if first <= 0.0 {
        return 0.0;
    }
    let years = series.len() as f64 / 12.0;
    ((last / first).powf(1.0 / years) - 1.0) * 100.0
}

/// Population standard deviation of the monthly change percentages.
pub fn volatility(series: &[HistoryPoint]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let changes: Vec<f64> = series.iter().map(|point| point.change_percentage).collect();
    let mean = changes.iter().sum::<f64>() / changes.len() as f64;
    let variance = changes
        .iter()
        .map(|change| (change - mean).powi(2))
        .sum::<f64>()
        / changes.len() as f64;
    variance.sqrt()
}

/// Largest peak-to-trough decline as a fraction of the running peak.
pub fn max_drawdown(initial_investment: f64, series: &[HistoryPoint]) -> f64 {
    let mut peak = initial_investment.max(0.0);
    let mut worst = 0.0_f64;
    for point in series {
        peak = peak.max(point.value);
        if peak > 0.0 {
            worst = worst.max((peak - point.value) / peak);
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn balanced_allocation() -> AppAllocation {
        AppAllocation {
            stocks: 30.0,
            gold: 10.0,
            fd: 25.0,
            bonds: 20.0,
            mutual_funds: 15.0,
        }
    }

    fn all_fd_allocation() -> AppAllocation {
        AppAllocation {
            stocks: 0.0,
            gold: 0.0,
            fd: 100.0,
            bonds: 0.0,
            mutual_funds: 0.0,
        }
    }

    #[test]
    fn projection_year_zero_is_the_initial_investment() {
        let market = MarketConfig::canonical();
        let series = project(&balanced_allocation(), &market.growth_rates, 100_000.0, 0)
            .expect("valid inputs");
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].year, 0);
        assert_approx(series[0].value, 100_000.0, 1e-9);
    }

    #[test]
    fn projection_compounds_each_slice_independently() {
        let market = MarketConfig::canonical();
        let all_stocks = AppAllocation {
            stocks: 100.0,
            gold: 0.0,
            fd: 0.0,
            bonds: 0.0,
            mutual_funds: 0.0,
        };
        let series =
            project(&all_stocks, &market.growth_rates, 100_000.0, 2).expect("valid inputs");
        // 100k at 12% for two years.
        assert_approx(series[2].value, 100_000.0 * 1.12 * 1.12, 1e-6);
    }

    #[test]
    fn projection_rejects_negative_investment() {
        let market = MarketConfig::canonical();
        assert!(project(&balanced_allocation(), &market.growth_rates, -1.0, 5).is_err());
    }

    #[test]
    fn history_with_pure_fd_and_no_noise_is_strictly_increasing() {
        let market = MarketConfig::canonical();
        let simulator = HistorySimulator::with_noise_span(&market, 0.0);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let series = simulator
            .simulate(&all_fd_allocation(), 100_000.0, 10, &mut rng)
            .expect("valid inputs");

        assert_eq!(series.len(), 120);
        let mut previous = 100_000.0;
        for point in &series {
            assert!(
                point.value > previous,
                "{} did not grow past {previous}",
                point.month
            );
            previous = point.value;
        }
    }

    #[test]
    fn history_is_reproducible_for_a_fixed_seed() {
        let market = MarketConfig::canonical();
        let simulator = HistorySimulator::new(&market);
        let first = simulator
            .simulate(
                &balanced_allocation(),
                100_000.0,
                10,
                &mut ChaCha20Rng::seed_from_u64(42),
            )
            .expect("valid inputs");
        let second = simulator
            .simulate(
                &balanced_allocation(),
                100_000.0,
                10,
                &mut ChaCha20Rng::seed_from_u64(42),
            )
            .expect("valid inputs");
        assert_eq!(first, second);
    }

    #[test]
    fn history_first_two_years_match_the_baseline_regardless_of_noise() {
        let market = MarketConfig::canonical();
        let noisy = HistorySimulator::new(&market)
            .simulate(
                &balanced_allocation(),
                50_000.0,
                2,
                &mut ChaCha20Rng::seed_from_u64(7),
            )
            .expect("valid inputs");
        let quiet = HistorySimulator::with_noise_span(&market, 0.0)
            .simulate(
                &balanced_allocation(),
                50_000.0,
                2,
                &mut ChaCha20Rng::seed_from_u64(99),
            )
            .expect("valid inputs");
        assert_eq!(noisy, quiet);
    }

    #[test]
    fn history_month_labels_run_from_march_2015() {
        let market = MarketConfig::canonical();
        let series = HistorySimulator::with_noise_span(&market, 0.0)
            .simulate(
                &balanced_allocation(),
                10_000.0,
                3,
                &mut ChaCha20Rng::seed_from_u64(0),
            )
            .expect("valid inputs");
        assert_eq!(series[0].month, "Mar 2015");
        assert_eq!(series[9].month, "Dec 2015");
        assert_eq!(series[10].month, "Jan 2016");
        assert_eq!(series[35].month, "Feb 2018");
    }

    #[test]
    fn history_rejects_a_zero_year_window() {
        let market = MarketConfig::canonical();
        let simulator = HistorySimulator::new(&market);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        assert!(
            simulator
                .simulate(&balanced_allocation(), 100_000.0, 0, &mut rng)
                .is_err()
        );
    }

    #[test]
    fn drawdown_is_zero_for_a_monotone_series() {
        let market = MarketConfig::canonical();
        let series = HistorySimulator::with_noise_span(&market, 0.0)
            .simulate(
                &all_fd_allocation(),
                100_000.0,
                10,
                &mut ChaCha20Rng::seed_from_u64(5),
            )
            .expect("valid inputs");
        assert_eq!(max_drawdown(100_000.0, &series), 0.0);
    }

    #[test]
    fn drawdown_captures_a_peak_to_trough_fall() {
        let series = vec![
            HistoryPoint { month: "Jan 2020".to_string(), value: 120.0, change_percentage: 20.0 },
            HistoryPoint { month: "Feb 2020".to_string(), value: 90.0, change_percentage: -25.0 },
            HistoryPoint { month: "Mar 2020".to_string(), value: 110.0, change_percentage: 22.2 },
        ];
        assert_approx(max_drawdown(100.0, &series), 0.25, 1e-9);
    }

    #[test]
    fn annualized_return_matches_pure_fd_compounding() {
        let market = MarketConfig::canonical();
        let series = HistorySimulator::with_noise_span(&market, 0.0)
            .simulate(
                &all_fd_allocation(),
                100_000.0,
                10,
                &mut ChaCha20Rng::seed_from_u64(5),
            )
            .expect("valid inputs");
        let annualized = annualized_return(&series);
        // Baseline FD months average roughly 0.86%/month, call it ~11%/year.
        assert!(annualized > 5.0 && annualized < 15.0, "got {annualized}");
    }

    #[test]
    fn volatility_is_zero_for_constant_changes() {
        let series: Vec<HistoryPoint> = (0..12)
            .map(|i| HistoryPoint {
                month: format!("m{i}"),
                value: 100.0,
                change_percentage: 1.0,
            })
            .collect();
        assert_approx(volatility(&series), 0.0, 1e-12);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_projection_is_monotone_for_non_negative_rates(
            stocks in 0u32..100,
            gold in 0u32..100,
            fd in 0u32..100,
            bonds in 0u32..100,
            mutual_funds in 0u32..100,
            initial in 1u32..1_000_000,
            horizon in 1u32..40,
        ) {
            let allocation = AppAllocation {
                stocks: stocks as f64,
                gold: gold as f64,
                fd: fd as f64,
                bonds: bonds as f64,
                mutual_funds: mutual_funds as f64,
            };
            proptest::prop_assume!(allocation.total() > 0.0);

            let market = MarketConfig::canonical();
            let series = project(&allocation, &market.growth_rates, initial as f64, horizon)
                .expect("valid inputs");
            prop_assert!(series.len() == horizon as usize + 1);
            for window in series.windows(2) {
                prop_assert!(window[1].value >= window[0].value - 1e-9);
            }
        }

        #[test]
        fn prop_history_series_stays_finite_and_positive(
            seed in proptest::prelude::any::<u64>(),
            window in 1u32..15,
        ) {
            let market = MarketConfig::canonical();
            let simulator = HistorySimulator::new(&market);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let series = simulator
                .simulate(&balanced_allocation(), 100_000.0, window, &mut rng)
                .expect("valid inputs");

            prop_assert!(series.len() == window as usize * 12);
            for point in &series {
                prop_assert!(point.value.is_finite() && point.value > 0.0);
                prop_assert!(point.change_percentage.is_finite());
            }
        }
    }
}

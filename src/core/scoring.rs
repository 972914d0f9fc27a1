//! Risk Scoring Engine: questionnaire responses to a 1–10 risk score.

use super::error::CoreError;
use super::tables::{PointTable, ScoringConfig};
use super::types::{AppAllocation, QuestionnaireResponse};

/// Maps a raw weighted score in [1, 5] onto the published [1, 10] scale.
fn normalize(raw: f64) -> f64 {
    ((raw - 1.0) / 4.0) * 9.0 + 1.0
}

fn lookup(table: PointTable, field: &'static str, value: &str) -> Result<f64, CoreError> {
    table
        .iter()
        .find(|(answer, _)| *answer == value)
        .map(|(_, points)| *points)
        .ok_or_else(|| CoreError::Configuration {
            field,
            value: value.to_string(),
        })
}

pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn canonical() -> Self {
        Self::new(ScoringConfig::canonical())
    }

    /// Pure function of the responses. Every single-choice answer must
    /// appear in its table; `primary_goal` alone falls back to the default
    /// score. Output is within [1, 10] whenever the configured weights sum
    /// to 1 and points stay in [1, 5].
    pub fn score(&self, responses: &QuestionnaireResponse) -> Result<f64, CoreError> {
        let c = &self.config;
        let w = &c.weights;
        let mut raw = 0.0;

        raw += lookup(c.age_group, "ageGroup", &responses.age_group)? * w.age_group;
        raw += lookup(c.monthly_income, "monthlyIncome", &responses.monthly_income)?
            * w.monthly_income;
        raw += lookup(
            c.savings_percentage,
            "savingsPercentage",
            &responses.savings_percentage,
        )? * w.savings_percentage;

        // More outstanding liabilities means less capacity to bear risk.
        let loans_score = (5.0 - responses.loans.len() as f64).max(1.0);
        raw += loans_score * w.loans;

        raw += lookup(
            c.investment_experience,
            "investmentExperience",
            &responses.investment_experience,
        )? * w.investment_experience;
        raw += lookup(c.risk_tolerance, "riskTolerance", &responses.risk_tolerance)?
            * w.risk_tolerance;
        raw += lookup(
            c.market_drop_reaction,
            "marketDropReaction",
            &responses.market_drop_reaction,
        )? * w.market_drop_reaction;

        let risky_count = responses
            .investment_interests
            .iter()
            .filter(|interest| c.risky_interests.contains(&interest.as_str()))
            .count();
        let interests_score = (risky_count as f64 + 1.0).min(5.0);
        raw += interests_score * w.investment_interests;

        let goal_score = c
            .goal_scores
            .iter()
            .find(|(goal, _)| *goal == responses.primary_goal)
            .map(|(_, points)| *points)
            .unwrap_or(c.goal_default);
        raw += goal_score * w.primary_goal;

        raw += lookup(c.time_horizon, "timeHorizon", &responses.time_horizon)? * w.time_horizon;
        raw += lookup(c.emergency_fund, "emergencyFund", &responses.emergency_fund)?
            * w.emergency_fund;

        Ok(normalize(raw))
    }
}

/// Riskiness points per application asset bucket, on the same [1, 5] scale
/// as the questionnaire tables.
const COMPOSITION_RISKINESS: [f64; 5] = [5.0, 3.0, 1.0, 2.0, 4.0]; // stocks, gold, fd, bonds, mutual funds

/// Deterministic risk score implied by a portfolio's composition: the
/// value-weighted riskiness of its buckets, normalized onto [1, 10].
pub fn composition_risk_score(allocation: &AppAllocation) -> Result<f64, CoreError> {
    let allocation = allocation.renormalized()?;
    let raw: f64 = allocation
        .as_array()
        .iter()
        .zip(COMPOSITION_RISKINESS)
        .map(|(pct, riskiness)| pct / 100.0 * riskiness)
        .sum();
    Ok(normalize(raw).clamp(1.0, 10.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_responses() -> QuestionnaireResponse {
        QuestionnaireResponse {
            age_group: "26-35".to_string(),
            monthly_income: "₹50,000 - ₹1,00,000".to_string(),
            savings_percentage: "20% - 30%".to_string(),
            loans: vec!["Home Loan".to_string()],
            investment_experience: "Intermediate".to_string(),
            risk_tolerance: "Medium".to_string(),
            market_drop_reaction: "Do nothing and wait for recovery".to_string(),
            investment_interests: vec!["Stocks".to_string(), "Gold".to_string()],
            primary_goal: "Saving for retirement".to_string(),
            time_horizon: "3-5 years".to_string(),
            emergency_fund: "Yes, covering 3-6 months of expenses".to_string(),
        }
    }

    fn minimum_risk_responses() -> QuestionnaireResponse {
        QuestionnaireResponse {
            age_group: "60+".to_string(),
            monthly_income: "Below ₹30,000".to_string(),
            savings_percentage: "Less than 10%".to_string(),
            loans: vec![
                "Home Loan".to_string(),
                "Car Loan".to_string(),
                "Personal Loan".to_string(),
                "Credit Card Debt".to_string(),
            ],
            investment_experience: "Beginner".to_string(),
            risk_tolerance: "Low".to_string(),
            market_drop_reaction: "Sell everything to prevent further loss".to_string(),
            investment_interests: vec![],
            primary_goal: "Saving for education".to_string(),
            time_horizon: "Less than 1 year".to_string(),
            emergency_fund: "No, I do not have an emergency fund".to_string(),
        }
    }

    fn maximum_risk_responses() -> QuestionnaireResponse {
        QuestionnaireResponse {
            age_group: "18-25".to_string(),
            monthly_income: "Above ₹2,00,000".to_string(),
            savings_percentage: "More than 50%".to_string(),
            loans: vec![],
            investment_experience: "Advanced".to_string(),
            risk_tolerance: "High".to_string(),
            market_drop_reaction: "Invest more to buy at lower prices".to_string(),
            investment_interests: vec![
                "Stocks".to_string(),
                "Mutual Funds".to_string(),
                "Real Estate".to_string(),
            ],
            primary_goal: "Wealth accumulation".to_string(),
            time_horizon: "5+ years".to_string(),
            emergency_fund: "Yes, covering 6+ months of expenses".to_string(),
        }
    }

    #[test]
    fn minimum_risk_profile_lands_near_the_floor() {
        let scorer = RiskScorer::canonical();
        let score = scorer
            .score(&minimum_risk_responses())
            .expect("valid responses");
        assert!(score <= 3.0, "expected a conservative score, got {score}");
        assert_approx(score, 1.225);
    }

    #[test]
    fn maximum_risk_profile_lands_near_the_ceiling() {
        let scorer = RiskScorer::canonical();
        let score = scorer
            .score(&maximum_risk_responses())
            .expect("valid responses");
        assert!(score > 9.0, "expected an aggressive score, got {score}");
        assert!(score <= 10.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer = RiskScorer::canonical();
        let responses = sample_responses();
        let first = scorer.score(&responses).expect("valid responses");
        let second = scorer.score(&responses).expect("valid responses");
        assert_approx(first, second);
    }

    #[test]
    fn unknown_single_choice_answer_is_a_configuration_error() {
        let scorer = RiskScorer::canonical();
        let mut responses = sample_responses();
        responses.risk_tolerance = "Extreme".to_string();

        let err = scorer
            .score(&responses)
            .expect_err("unknown tolerance must fail");
        match err {
            CoreError::Configuration { field, value } => {
                assert_eq!(field, "riskTolerance");
                assert_eq!(value, "Extreme");
            }
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_goal_falls_back_to_the_default_score() {
        let scorer = RiskScorer::canonical();
        let mut responses = sample_responses();
        responses.primary_goal = "Buying a boat".to_string();
        let unknown_goal = scorer.score(&responses).expect("valid responses");

        responses.primary_goal = "Saving for retirement".to_string(); // also scores 3
        let known_goal = scorer.score(&responses).expect("valid responses");
        assert_approx(unknown_goal, known_goal);
    }

    #[test]
    fn extra_loans_lower_the_score() {
        let scorer = RiskScorer::canonical();
        let mut responses = sample_responses();
        responses.loans = vec![];
        let unburdened = scorer.score(&responses).expect("valid responses");

        responses.loans = vec![
            "Home Loan".to_string(),
            "Car Loan".to_string(),
            "Personal Loan".to_string(),
        ];
        let burdened = scorer.score(&responses).expect("valid responses");
        assert!(burdened < unburdened);
    }

    #[test]
    fn only_risky_interests_move_the_interest_score() {
        let scorer = RiskScorer::canonical();
        let mut responses = sample_responses();
        responses.investment_interests = vec!["Gold".to_string(), "Bonds".to_string()];
        let safe = scorer.score(&responses).expect("valid responses");

        responses.investment_interests = vec!["Gold".to_string(), "Stocks".to_string()];
        let risky = scorer.score(&responses).expect("valid responses");
        assert!(risky > safe);
    }

    #[test]
    fn composition_score_orders_safe_below_risky() {
        let all_fd = AppAllocation {
            stocks: 0.0,
            gold: 0.0,
            fd: 100.0,
            bonds: 0.0,
            mutual_funds: 0.0,
        };
        let all_stocks = AppAllocation {
            stocks: 100.0,
            gold: 0.0,
            fd: 0.0,
            bonds: 0.0,
            mutual_funds: 0.0,
        };
        let safe = composition_risk_score(&all_fd).expect("valid allocation");
        let risky = composition_risk_score(&all_stocks).expect("valid allocation");
        assert_approx(safe, 1.0);
        assert_approx(risky, 10.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_score_stays_in_range(
            age_idx in 0usize..5,
            income_idx in 0usize..5,
            savings_idx in 0usize..5,
            experience_idx in 0usize..3,
            tolerance_idx in 0usize..3,
            reaction_idx in 0usize..3,
            horizon_idx in 0usize..4,
            emergency_idx in 0usize..3,
            goal_idx in 0usize..5,
            loan_count in 0usize..5,
            interest_mask in 0u8..32,
        ) {
            let config = ScoringConfig::canonical();
            let all_interests = ["Stocks", "Bonds", "Mutual Funds", "Real Estate", "Gold"];
            let loans = ["Home Loan", "Car Loan", "Personal Loan", "Credit Card Debt", "No Loans"];

            let responses = QuestionnaireResponse {
                age_group: config.age_group[age_idx].0.to_string(),
                monthly_income: config.monthly_income[income_idx].0.to_string(),
                savings_percentage: config.savings_percentage[savings_idx].0.to_string(),
                loans: loans[..loan_count].iter().map(|l| l.to_string()).collect(),
                investment_experience: config.investment_experience[experience_idx].0.to_string(),
                risk_tolerance: config.risk_tolerance[tolerance_idx].0.to_string(),
                market_drop_reaction: config.market_drop_reaction[reaction_idx].0.to_string(),
                investment_interests: all_interests
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| interest_mask & (1u8 << i) != 0)
                    .map(|(_, interest)| interest.to_string())
                    .collect(),
                primary_goal: config.goal_scores[goal_idx].0.to_string(),
                time_horizon: config.time_horizon[horizon_idx].0.to_string(),
                emergency_fund: config.emergency_fund[emergency_idx].0.to_string(),
            };

            let scorer = RiskScorer::canonical();
            let score = scorer.score(&responses).expect("valid responses");
            prop_assert!((1.0..=10.0).contains(&score), "score {score} out of range");
        }
    }
}

//! The Based Score: how many points a claim is worth and how many reward
//! tokens those points pay out.
//!
//! Scoring is pure. Token amounts are fixed point integers in the token's
//! base unit, so a payout of `7.5` tokens is exactly `7.5` on chain.

use {
    super::{
        claim::{Claim, TimeSpent},
        eth,
    },
    anyhow::{Context, Result},
    bigdecimal::BigDecimal,
};

/// Points for a correct answer.
pub const BASE_POINTS: u64 = 10;
/// Streak length that earns the one-off perfect streak bonus.
pub const PERFECT_STREAK: u64 = 10;
/// Bonus points for hitting [`PERFECT_STREAK`].
pub const PERFECT_STREAK_BONUS: u64 = 20;

/// Bonus points for answering quickly.
pub fn speed_bonus(time_spent: TimeSpent) -> u64 {
    match time_spent.seconds() {
        t if t < 2.0 => 5,
        t if t < 5.0 => 3,
        t if t < 10.0 => 1,
        _ => 0,
    }
}

/// Bonus points for the player's current on-chain streak.
pub fn streak_bonus(streak: u64, is_correct: bool) -> u64 {
    if !is_correct {
        return 0;
    }
    let perfect = if streak == PERFECT_STREAK {
        PERFECT_STREAK_BONUS
    } else {
        0
    };
    streak.saturating_mul(2).saturating_add(perfect)
}

/// Payout parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    /// Tokens paid for a Based Score of [`BASE_POINTS`].
    pub base_reward: BigDecimal,
    /// Flat amount paid for an incorrect answer.
    pub participation_reward: BigDecimal,
    pub token_decimals: u8,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            base_reward: BigDecimal::from(5),
            participation_reward: BigDecimal::from(1),
            token_decimals: 18,
        }
    }
}

/// Computes score breakdowns for claims.
#[derive(Debug, Clone)]
pub struct Engine {
    decimals: u8,
    /// Base units paid per point of Based Score.
    per_point: eth::U256,
    participation: eth::U256,
}

impl Engine {
    /// Fails if the configured rewards can't be expressed in the token's
    /// base units.
    pub fn new(rules: &Rules) -> Result<Self> {
        let per_point = &rules.base_reward / &BigDecimal::from(BASE_POINTS);
        Ok(Self {
            decimals: rules.token_decimals,
            per_point: number::conversions::to_base_units(&per_point, rules.token_decimals)
                .context("base reward")?,
            participation: number::conversions::to_base_units(
                &rules.participation_reward,
                rules.token_decimals,
            )
            .context("participation reward")?,
        })
    }

    pub fn compute(&self, claim: &Claim, streak: u64) -> Breakdown {
        if !claim.is_correct {
            return Breakdown {
                base_points: 0,
                speed_bonus: 0,
                streak_bonus: 0,
                based_score: 0,
                reward: self.amount(self.participation),
                participation_only: true,
            };
        }

        let speed_bonus = claim.time_spent.map(speed_bonus).unwrap_or_default();
        let streak_bonus = streak_bonus(streak, true);
        let based_score = BASE_POINTS
            .saturating_add(speed_bonus)
            .saturating_add(streak_bonus);
        Breakdown {
            base_points: BASE_POINTS,
            speed_bonus,
            streak_bonus,
            based_score,
            reward: self.amount(self.per_point.saturating_mul(eth::U256::from(based_score))),
            participation_only: false,
        }
    }

    fn amount(&self, units: eth::U256) -> eth::TokenAmount {
        eth::TokenAmount {
            units,
            decimals: self.decimals,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakdown {
    pub base_points: u64,
    pub speed_bonus: u64,
    pub streak_bonus: u64,
    pub based_score: u64,
    pub reward: eth::TokenAmount,
    /// The answer was wrong and only the flat participation reward applies.
    pub participation_only: bool,
}

use {
    crate::domain::{claim, eth, reward, score},
    number::serialization::DecimalU256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

/// A reward claim as posted by the quiz frontend. Unknown fields such as
/// the submitted answer are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    address: Option<String>,
    quiz_id: Option<u64>,
    is_correct: Option<bool>,
    #[serde(alias = "timeSpent")]
    time_spent_seconds: Option<f64>,
    #[serde(alias = "socialShare")]
    social_share_requested: Option<bool>,
}

impl Claim {
    pub fn into_domain(self) -> claim::Raw {
        claim::Raw {
            address: self.address,
            quiz_id: self.quiz_id,
            is_correct: self.is_correct,
            time_spent_seconds: self.time_spent_seconds,
            social_share_requested: self.social_share_requested.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RewardType {
    QuizReward,
    SocialShareBonus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    success: bool,
    message: String,
    transaction_hash: String,
    block_number: u64,
    quiz_id: u64,
    player_address: String,
    is_correct: bool,
    reward_type: RewardType,
    #[serde(flatten)]
    score: Option<Score>,
    gas_used: u64,
    processing_time_ms: u128,
    timestamp: String,
}

#[serde_as]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Score {
    based_score: u64,
    speed_bonus: u64,
    streak_bonus: u64,
    /// Decimal string, e.g. `"7.5"`.
    reward_amount_tokens: String,
    /// The same amount in the token's smallest unit.
    #[serde_as(as = "DecimalU256")]
    reward_amount_wei: eth::U256,
}

impl Reward {
    pub fn new(reward: &reward::Reward) -> Self {
        Self {
            success: true,
            message: message(reward.score.as_ref()),
            transaction_hash: reward.receipt.tx.to_string(),
            block_number: reward.receipt.block.0,
            quiz_id: reward.claim.quiz_id.0,
            player_address: reward.claim.player.to_checksum(None),
            is_correct: reward.claim.is_correct,
            reward_type: match reward.score {
                Some(_) => RewardType::QuizReward,
                None => RewardType::SocialShareBonus,
            },
            score: reward.score.as_ref().map(|score| Score {
                based_score: score.based_score,
                speed_bonus: score.speed_bonus,
                streak_bonus: score.streak_bonus,
                reward_amount_tokens: score.reward.to_string(),
                reward_amount_wei: score.reward.units,
            }),
            gas_used: reward.receipt.gas_used.0,
            processing_time_ms: reward.processing_time.as_millis(),
            timestamp: crate::api::timestamp(),
        }
    }
}

fn message(score: Option<&score::Breakdown>) -> String {
    match score {
        None => "Social share bonus awarded!".to_string(),
        Some(score) if score.participation_only => format!(
            "Thanks for playing! Awarded {} participation tokens",
            score.reward
        ),
        Some(score) => format!(
            "Based! Awarded {} tokens with Based Score: {}",
            score.reward, score.based_score
        ),
    }
}

use {
    super::{claim::QuizId, eth},
    std::fmt,
};

/// A state changing call on the quiz contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SocialShareBonus {
        player: eth::Address,
    },
    DistributeReward {
        quiz_id: QuizId,
        player: eth::Address,
        /// The computed payout. The contract derives the transferred amount
        /// itself, this is what the service expects it to pay.
        amount: eth::TokenAmount,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SocialShareBonus { player } => write!(f, "awardSocialShareBonus({player})"),
            Self::DistributeReward { quiz_id, player, .. } => {
                write!(f, "distributeReward({quiz_id}, [{player}])")
            }
        }
    }
}

/// Lifecycle of a submitted operation. Operations are never retried, so
/// every operation ends in exactly one of the final three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum State {
    Estimated,
    Submitted,
    Confirmed,
    Reverted,
    NetworkFailed,
}

/// A transaction that was accepted by the node but is not known to be
/// mined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub tx: eth::TxId,
    pub gas_limit: eth::Gas,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub tx: eth::TxId,
    pub block: eth::BlockNo,
    pub gas_used: eth::Gas,
    pub success: bool,
}

impl Receipt {
    pub fn state(&self) -> State {
        if self.success {
            State::Confirmed
        } else {
            State::Reverted
        }
    }
}

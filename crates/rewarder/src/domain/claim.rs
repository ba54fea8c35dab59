//! Reward claims submitted by players.
//!
//! A [`Raw`] claim is untrusted input. It becomes a [`Claim`] only after
//! [`Raw::validate`] succeeded, which happens before anything touches the
//! chain.

use {
    super::eth,
    derive_more::{Display, From, Into},
    std::str::FromStr,
    thiserror::Error,
};

/// Identifier of a quiz round as known to the contract.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct QuizId(pub u64);

/// A claim exactly as the client sent it.
#[derive(Debug, Clone, Default)]
pub struct Raw {
    pub address: Option<String>,
    pub quiz_id: Option<u64>,
    pub is_correct: Option<bool>,
    pub time_spent_seconds: Option<f64>,
    pub social_share_requested: bool,
}

/// A syntactically valid claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub player: eth::Address,
    pub quiz_id: QuizId,
    pub is_correct: bool,
    /// How long the player took to answer. `None` if the client did not
    /// report it, in which case no speed bonus applies.
    pub time_spent: Option<TimeSpent>,
    pub social_share_requested: bool,
}

/// Seconds a player took to answer, as reported by the client. Always
/// finite and not negative, but otherwise unbounded.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpent(f64);

impl TimeSpent {
    pub fn new(seconds: f64) -> Option<Self> {
        (seconds.is_finite() && seconds >= 0.0).then_some(Self(seconds))
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}

// NaN is never constructed.
impl Eq for TimeSpent {}

impl Raw {
    pub fn validate(self) -> Result<Claim, Invalid> {
        let address = self.address.ok_or(Invalid::Missing("address"))?;
        let quiz_id = self.quiz_id.ok_or(Invalid::Missing("quizId"))?;
        let is_correct = self.is_correct.ok_or(Invalid::Missing("isCorrect"))?;
        let player = parse_address(&address).ok_or(Invalid::Address(address))?;
        let time_spent = self
            .time_spent_seconds
            .map(|secs| TimeSpent::new(secs).ok_or(Invalid::TimeSpent(secs)))
            .transpose()?;

        Ok(Claim {
            player,
            quiz_id: QuizId(quiz_id),
            is_correct,
            time_spent,
            social_share_requested: self.social_share_requested,
        })
    }
}

/// Parses a `0x` prefixed hex address. Mixed case addresses must carry a
/// valid EIP-55 checksum, all lower or all upper case ones are taken as is.
///
/// https://eips.ethereum.org/EIPS/eip-55
fn parse_address(value: &str) -> Option<eth::Address> {
    let hex = value.strip_prefix("0x")?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        eth::Address::parse_checksummed(value, None).ok()
    } else {
        eth::Address::from_str(hex).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Invalid {
    #[error("missing `{0}`: address, quizId, and isCorrect required")]
    Missing(&'static str),
    #[error("invalid wallet address format: {0:?}")]
    Address(String),
    #[error("invalid time spent: {0}")]
    TimeSpent(f64),
}

//! Turning a claim into a confirmed on-chain reward.
//!
//! [`Service::process`] runs each claim through
//! `Validating -> Authorizing -> Estimating -> Submitting -> Confirming` and
//! ends with exactly one outcome: a [`Reward`] or a typed [`Error`]. Nothing
//! is retried and nothing is kept between requests, the contract is the
//! only ledger.

use {
    super::{
        chain,
        claim::{self, Claim},
        eth,
        operation::{self, Operation, Receipt},
        score,
    },
    crate::infra::observe,
    std::time::{Duration, Instant},
    thiserror::Error,
    tracing::Instrument,
};

/// The owner credential as it was found at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Missing,
    /// A credential was configured but no signer could be derived from it.
    Invalid(String),
    Loaded(eth::Address),
}

impl Identity {
    pub fn address(&self) -> Option<eth::Address> {
        match self {
            Self::Loaded(address) => Some(*address),
            _ => None,
        }
    }

    fn signer(&self) -> Result<eth::Address, Error> {
        match self {
            Self::Loaded(address) => Ok(*address),
            Self::Missing => Err(Error::Configuration(
                "owner private key not configured".to_string(),
            )),
            Self::Invalid(reason) => Err(Error::Configuration(format!(
                "invalid owner private key: {reason}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Validating,
    Authorizing,
    Estimating,
    Submitting,
    Confirming,
}

pub struct Service {
    chain: chain::Client,
    engine: score::Engine,
    identity: Identity,
}

impl Service {
    pub fn new(chain: chain::Client, engine: score::Engine, identity: Identity) -> Self {
        Self {
            chain,
            engine,
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn chain(&self) -> &chain::Client {
        &self.chain
    }

    pub async fn process(&self, raw: claim::Raw) -> Result<Reward, Error> {
        let start = Instant::now();
        let result = self.execute(raw, start).await;
        observe::processed(&result, start.elapsed());
        result
    }

    async fn execute(&self, raw: claim::Raw, start: Instant) -> Result<Reward, Error> {
        observe::stage(Stage::Validating);
        let claim = raw.validate()?;

        let span = tracing::info_span!("claim", player = %claim.player, quiz = %claim.quiz_id);
        async move {
            observe::stage(Stage::Authorizing);
            let signer = self.identity.signer()?;
            self.chain.check_operational_readiness(signer).await?;
            self.chain.verify_authorization(signer).await?;

            let (operation, score) = if claim.social_share_requested {
                (
                    Operation::SocialShareBonus {
                        player: claim.player,
                    },
                    None,
                )
            } else {
                let streak = if claim.is_correct {
                    self.chain.current_streak(claim.player).await
                } else {
                    0
                };
                let score = self.engine.compute(&claim, streak);
                (
                    Operation::DistributeReward {
                        quiz_id: claim.quiz_id,
                        player: claim.player,
                        amount: score.reward,
                    },
                    Some(score),
                )
            };

            observe::stage(Stage::Estimating);
            let pending = self.chain.estimate_and_submit(&operation).await?;

            observe::stage(Stage::Confirming);
            let receipt = self.chain.await_confirmation(pending).await?;

            Ok::<_, Error>(Reward {
                claim,
                score,
                receipt,
                processing_time: start.elapsed(),
            })
        }
        .instrument(span)
        .await
    }
}

/// A confirmed payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reward {
    pub claim: Claim,
    /// `None` for social share bonuses, which are not scored.
    pub score: Option<score::Breakdown>,
    pub receipt: Receipt,
    pub processing_time: Duration,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidInput(#[from] claim::Invalid),
    #[error("{0}")]
    Configuration(String),
    #[error("network unavailable: {message}")]
    NetworkUnavailable {
        message: String,
        /// Set if the transaction was already submitted when the node was
        /// lost. Its outcome is unknown.
        tx: Option<eth::TxId>,
    },
    #[error(
        "insufficient funds for gas: owner balance {} ETH is below the {} ETH reserve",
        .balance.to_decimal(),
        .reserve.to_decimal()
    )]
    InsufficientFunds {
        balance: eth::Ether,
        reserve: eth::Ether,
    },
    #[error("signer {signer} is not the contract owner {owner}")]
    UnauthorizedSigner {
        signer: eth::Address,
        owner: eth::Address,
    },
    #[error("gas estimation failed: {reason}")]
    EstimationFailed { reason: String },
    #[error("transaction {tx} reverted")]
    TransactionReverted { tx: eth::TxId },
    #[error("transaction {tx} was not confirmed within {timeout:?}")]
    ConfirmationTimeout {
        tx: eth::TxId,
        timeout: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
pub enum Kind {
    InvalidInput,
    ConfigurationError,
    NetworkUnavailable,
    InsufficientFunds,
    UnauthorizedSigner,
    EstimationFailed,
    TransactionReverted,
    ConfirmationTimeout,
}

impl Error {
    pub(super) fn network(err: chain::Error, tx: Option<eth::TxId>) -> Self {
        Self::NetworkUnavailable {
            message: err.to_string(),
            tx,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::InvalidInput(_) => Kind::InvalidInput,
            Self::Configuration(_) => Kind::ConfigurationError,
            Self::NetworkUnavailable { .. } => Kind::NetworkUnavailable,
            Self::InsufficientFunds { .. } => Kind::InsufficientFunds,
            Self::UnauthorizedSigner { .. } => Kind::UnauthorizedSigner,
            Self::EstimationFailed { .. } => Kind::EstimationFailed,
            Self::TransactionReverted { .. } => Kind::TransactionReverted,
            Self::ConfirmationTimeout { .. } => Kind::ConfirmationTimeout,
        }
    }

    /// Where the failure left the submitted operation. `None` if nothing was
    /// submitted.
    pub fn operation_state(&self) -> Option<operation::State> {
        match self {
            Self::TransactionReverted { .. } => Some(operation::State::Reverted),
            Self::NetworkUnavailable { tx: Some(_), .. } | Self::ConfirmationTimeout { .. } => {
                Some(operation::State::NetworkFailed)
            }
            _ => None,
        }
    }

    /// The submitted transaction, if the failure happened after submission.
    pub fn tx(&self) -> Option<eth::TxId> {
        match self {
            Self::NetworkUnavailable { tx, .. } => *tx,
            Self::TransactionReverted { tx } | Self::ConfirmationTimeout { tx, .. } => Some(*tx),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::domain::chain::MockLedger,
        alloy::primitives::{address, b256},
        bigdecimal::BigDecimal,
        number::units::EthUnit,
        std::{str::FromStr, sync::Arc},
    };

    const OWNER: eth::Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const PLAYER: eth::Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const TX: eth::TxId = eth::TxId(b256!(
        "0x2222222222222222222222222222222222222222222222222222222222222222"
    ));

    fn service(ledger: MockLedger, identity: Identity) -> Service {
        Service::new(
            chain::Client::new(Arc::new(ledger), chain::Policy::default()),
            score::Engine::new(&score::Rules::default()).unwrap(),
            identity,
        )
    }

    fn raw() -> claim::Raw {
        claim::Raw {
            address: Some(PLAYER.to_string()),
            quiz_id: Some(3),
            is_correct: Some(true),
            time_spent_seconds: Some(1.5),
            social_share_requested: false,
        }
    }

    /// A ledger where the owner is funded and authorized.
    fn ready_ledger() -> MockLedger {
        let mut ledger = MockLedger::new();
        ledger
            .expect_balance()
            .returning(|_| Ok(eth::Ether(1u64.eth())));
        ledger.expect_owner().returning(|| Ok(OWNER));
        ledger
    }

    fn mined(success: bool) -> Receipt {
        Receipt {
            tx: TX,
            block: eth::BlockNo(100),
            gas_used: eth::Gas(61_000),
            success,
        }
    }

    #[tokio::test]
    async fn invalid_claim_never_touches_the_chain() {
        let mut ledger = MockLedger::new();
        ledger.expect_chain_id().never();
        ledger.expect_balance().never();
        ledger.expect_owner().never();
        ledger.expect_streak().never();
        ledger.expect_estimate_gas().never();
        ledger.expect_send().never();
        ledger.expect_receipt().never();

        let err = service(ledger, Identity::Loaded(OWNER))
            .process(claim::Raw {
                address: Some("0xnot-an-address".to_string()),
                ..raw()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidInput);
    }

    #[tokio::test]
    async fn missing_credential_is_a_configuration_error() {
        let mut ledger = MockLedger::new();
        ledger.expect_balance().never();
        ledger.expect_send().never();

        let err = service(ledger, Identity::Missing)
            .process(raw())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::ConfigurationError);
    }

    #[tokio::test]
    async fn invalid_credential_is_a_configuration_error() {
        let mut ledger = MockLedger::new();
        ledger.expect_balance().never();
        ledger.expect_owner().never();
        ledger.expect_send().never();

        let err = service(ledger, Identity::Invalid("odd number of digits".into()))
            .process(raw())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::ConfigurationError);
        assert_eq!(
            err.to_string(),
            "invalid owner private key: odd number of digits"
        );
    }

    #[tokio::test]
    async fn pays_scored_reward() {
        let mut ledger = ready_ledger();
        ledger
            .expect_streak()
            .with(mockall::predicate::eq(PLAYER))
            .returning(|_| Ok(10));
        ledger
            .expect_estimate_gas()
            .returning(|_| Ok(eth::Gas(80_000)));
        ledger
            .expect_send()
            .withf(|op, _| {
                matches!(
                    op,
                    Operation::DistributeReward { quiz_id, player, .. }
                        if *quiz_id == claim::QuizId(3) && *player == PLAYER
                )
            })
            .times(1)
            .returning(|_, _| Ok(TX));
        ledger
            .expect_receipt()
            .returning(|_| Ok(Some(mined(true))));

        let reward = service(ledger, Identity::Loaded(OWNER))
            .process(claim::Raw {
                time_spent_seconds: Some(7.0),
                ..raw()
            })
            .await
            .unwrap();
        let score = reward.score.unwrap();
        assert_eq!(score.based_score, 51);
        assert_eq!(
            score.reward.to_decimal(),
            BigDecimal::from_str("25.5").unwrap()
        );
        assert_eq!(reward.receipt, mined(true));
    }

    #[tokio::test]
    async fn incorrect_answer_skips_streak_lookup() {
        let mut ledger = ready_ledger();
        ledger.expect_streak().never();
        ledger
            .expect_estimate_gas()
            .returning(|_| Ok(eth::Gas(80_000)));
        ledger.expect_send().returning(|_, _| Ok(TX));
        ledger
            .expect_receipt()
            .returning(|_| Ok(Some(mined(true))));

        let reward = service(ledger, Identity::Loaded(OWNER))
            .process(claim::Raw {
                is_correct: Some(false),
                ..raw()
            })
            .await
            .unwrap();
        let score = reward.score.unwrap();
        assert!(score.participation_only);
        assert_eq!(score.reward.to_decimal(), BigDecimal::from(1));
    }

    #[tokio::test]
    async fn social_share_bypasses_scoring() {
        let mut ledger = ready_ledger();
        ledger.expect_streak().never();
        ledger
            .expect_estimate_gas()
            .withf(|op| *op == Operation::SocialShareBonus { player: PLAYER })
            .returning(|_| Ok(eth::Gas(40_000)));
        ledger.expect_send().times(1).returning(|_, _| Ok(TX));
        ledger
            .expect_receipt()
            .returning(|_| Ok(Some(mined(true))));

        let reward = service(ledger, Identity::Loaded(OWNER))
            .process(claim::Raw {
                social_share_requested: true,
                ..raw()
            })
            .await
            .unwrap();
        assert_eq!(reward.score, None);
    }

    #[tokio::test]
    async fn estimation_failure_sends_nothing() {
        let mut ledger = ready_ledger();
        ledger.expect_streak().returning(|_| Ok(0));
        ledger.expect_estimate_gas().returning(|_| {
            Err(chain::Error::Contract {
                reason: "Reward already claimed".into(),
            })
        });
        ledger.expect_send().never();
        ledger.expect_receipt().never();

        let err = service(ledger, Identity::Loaded(OWNER))
            .process(raw())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::EstimationFailed);
        assert_eq!(
            err.to_string(),
            "gas estimation failed: Reward already claimed"
        );
    }

    #[tokio::test]
    async fn unauthorized_signer_sends_nothing() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_balance()
            .returning(|_| Ok(eth::Ether(1u64.eth())));
        ledger.expect_owner().returning(|| Ok(PLAYER));
        ledger.expect_estimate_gas().never();
        ledger.expect_send().never();

        let err = service(ledger, Identity::Loaded(OWNER))
            .process(raw())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::UnauthorizedSigner);
    }

    #[tokio::test]
    async fn reverted_transaction_is_distinct_from_nothing_happened() {
        let mut ledger = ready_ledger();
        ledger.expect_streak().returning(|_| Ok(0));
        ledger
            .expect_estimate_gas()
            .returning(|_| Ok(eth::Gas(80_000)));
        ledger.expect_send().returning(|_, _| Ok(TX));
        ledger
            .expect_receipt()
            .returning(|_| Ok(Some(mined(false))));

        let err = service(ledger, Identity::Loaded(OWNER))
            .process(raw())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::TransactionReverted);
        assert_eq!(err.tx(), Some(TX));
        assert_eq!(err.operation_state(), Some(operation::State::Reverted));
    }

    #[test]
    fn operation_state_of_failures() {
        let network = |tx| Error::NetworkUnavailable {
            message: "connection reset".into(),
            tx,
        };
        assert_eq!(network(None).operation_state(), None);
        assert_eq!(
            network(Some(TX)).operation_state(),
            Some(operation::State::NetworkFailed)
        );
        assert_eq!(
            Error::ConfirmationTimeout {
                tx: TX,
                timeout: Duration::from_secs(60),
            }
            .operation_state(),
            Some(operation::State::NetworkFailed)
        );
        assert_eq!(
            Error::EstimationFailed {
                reason: "Reward already claimed".into()
            }
            .operation_state(),
            None
        );
    }

    #[tokio::test]
    async fn records_operation_lifecycle() {
        let count = |state: operation::State| {
            observe::metrics::get()
                .operations
                .with_label_values(&[<&'static str>::from(state)])
                .get()
        };
        let submitting = || {
            observe::metrics::get()
                .stages
                .with_label_values(&[<&'static str>::from(Stage::Submitting)])
                .get()
        };
        let before = (
            count(operation::State::Estimated),
            count(operation::State::Submitted),
            count(operation::State::Confirmed),
            submitting(),
        );

        let mut ledger = ready_ledger();
        ledger.expect_streak().returning(|_| Ok(0));
        ledger
            .expect_estimate_gas()
            .returning(|_| Ok(eth::Gas(80_000)));
        ledger.expect_send().returning(|_, _| Ok(TX));
        ledger
            .expect_receipt()
            .returning(|_| Ok(Some(mined(true))));
        let reward = service(ledger, Identity::Loaded(OWNER))
            .process(raw())
            .await
            .unwrap();
        assert_eq!(reward.receipt.state(), operation::State::Confirmed);

        // Other tests record into the same registry concurrently.
        assert!(count(operation::State::Estimated) > before.0);
        assert!(count(operation::State::Submitted) > before.1);
        assert!(count(operation::State::Confirmed) > before.2);
        assert!(submitting() > before.3);
    }

    #[test]
    fn kinds_are_pascal_case() {
        assert_eq!(Kind::ConfigurationError.to_string(), "ConfigurationError");
        let kind: &'static str = Kind::EstimationFailed.into();
        assert_eq!(kind, "EstimationFailed");
    }
}

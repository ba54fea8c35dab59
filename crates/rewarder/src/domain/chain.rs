//! Everything the service does on chain.
//!
//! [`Ledger`] is the raw node + contract seam. [`Client`] layers the
//! submission policy on top of it: the funds and authorization checks, the
//! gas limit rules and the bounded wait for confirmation.

use {
    super::{
        eth,
        operation::{Operation, Pending, Receipt},
        reward,
    },
    crate::infra::observe,
    number::units::EthUnit,
    std::{sync::Arc, time::Duration},
    thiserror::Error,
};

/// Access to the node and the quiz contract on behalf of the owner account.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    async fn chain_id(&self) -> Result<eth::ChainId, Error>;

    async fn balance(&self, account: eth::Address) -> Result<eth::Ether, Error>;

    /// The owner recorded by the quiz contract.
    async fn owner(&self) -> Result<eth::Address, Error>;

    /// The player's current streak of correct answers.
    async fn streak(&self, player: eth::Address) -> Result<u64, Error>;

    async fn estimate_gas(&self, operation: &Operation) -> Result<eth::Gas, Error>;

    /// Signs and broadcasts the operation. Returns as soon as the node
    /// accepted the transaction.
    async fn send(&self, operation: &Operation, gas_limit: eth::Gas) -> Result<eth::TxId, Error>;

    /// `None` while the transaction is not mined.
    async fn receipt(&self, tx: eth::TxId) -> Result<Option<Receipt>, Error>;
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The node could not be reached or answered with an error.
    #[error("node error: {0}")]
    Node(String),
    /// The contract rejected the call.
    #[error("execution reverted: {reason}")]
    Contract { reason: String },
    #[error("no signer configured")]
    Signer,
    #[error("failed to sign transaction: {0}")]
    Signing(String),
    /// The signed transaction was handed to the node but no answer came
    /// back, so it may or may not have been accepted.
    #[error("broadcast of transaction {tx} failed: {message}")]
    Broadcast { tx: eth::TxId, message: String },
}

impl Error {
    /// The most specific description of what went wrong, a revert reason if
    /// there is one.
    pub fn reason(&self) -> String {
        match self {
            Self::Contract { reason } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// The transaction this error leaves in an unknown state.
    pub fn tx(&self) -> Option<eth::TxId> {
        match self {
            Self::Broadcast { tx, .. } => Some(*tx),
            _ => None,
        }
    }
}

/// What to do when the contract owner can't be looked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Authorization {
    /// Submit anyway, the contract checks authorization itself.
    #[default]
    FailOpen,
    /// Refuse to submit.
    FailClosed,
}

#[derive(Debug, Clone)]
pub struct Policy {
    /// Minimum owner balance required to submit anything.
    pub gas_reserve: eth::Ether,
    pub gas_limit_multiplier: u64,
    pub gas_limit_floor: eth::Gas,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    pub authorization: Authorization,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            // 0.001 ETH
            gas_reserve: eth::Ether(1_000_000u64.gwei()),
            gas_limit_multiplier: 2,
            gas_limit_floor: eth::Gas(200_000),
            confirmation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            authorization: Authorization::FailOpen,
        }
    }
}

impl Policy {
    pub fn gas_limit(&self, estimate: eth::Gas) -> eth::Gas {
        eth::Gas(estimate.0.saturating_mul(self.gas_limit_multiplier)).max(self.gas_limit_floor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// The connected chain or why the node could not be reached.
    pub network: Result<eth::ChainId, String>,
    /// `None` if there is no signer or the balance could not be fetched.
    pub balance: Option<eth::Ether>,
}

#[derive(Clone)]
pub struct Client {
    ledger: Arc<dyn Ledger>,
    policy: Policy,
}

impl Client {
    pub fn new(ledger: Arc<dyn Ledger>, policy: Policy) -> Self {
        Self { ledger, policy }
    }

    /// Connectivity and owner balance, for health reporting.
    pub async fn status(&self, signer: Option<eth::Address>) -> Status {
        let network = self.ledger.chain_id().await.map_err(|err| err.to_string());
        let balance = match (&network, signer) {
            (Ok(_), Some(signer)) => self.ledger.balance(signer).await.ok(),
            _ => None,
        };
        Status { network, balance }
    }

    /// Checks that the signer can pay for gas.
    pub async fn check_operational_readiness(
        &self,
        signer: eth::Address,
    ) -> Result<eth::Ether, reward::Error> {
        let balance = self
            .ledger
            .balance(signer)
            .await
            .map_err(|err| reward::Error::network(err, None))?;
        tracing::debug!(balance = %balance.to_decimal(), "owner balance");
        if balance < self.policy.gas_reserve {
            return Err(reward::Error::InsufficientFunds {
                balance,
                reserve: self.policy.gas_reserve,
            });
        }
        Ok(balance)
    }

    /// Checks that the signer is the contract owner. A failed lookup is
    /// handled according to [`Policy::authorization`].
    pub async fn verify_authorization(&self, signer: eth::Address) -> Result<(), reward::Error> {
        match self.ledger.owner().await {
            Ok(owner) if owner == signer => Ok(()),
            Ok(owner) => Err(reward::Error::UnauthorizedSigner { signer, owner }),
            Err(err) => match self.policy.authorization {
                Authorization::FailOpen => {
                    tracing::warn!(?err, "could not verify contract owner, proceeding");
                    Ok(())
                }
                Authorization::FailClosed => Err(reward::Error::network(err, None)),
            },
        }
    }

    /// The player's streak. Lookup failures count as no streak, which can
    /// only ever underpay.
    pub async fn current_streak(&self, player: eth::Address) -> u64 {
        match self.ledger.streak(player).await {
            Ok(streak) => streak,
            Err(err) => {
                tracing::warn!(?err, %player, "failed to fetch streak, assuming 0");
                0
            }
        }
    }

    /// Estimates gas for the operation and submits it. Nothing is sent if
    /// the estimate fails.
    pub async fn estimate_and_submit(&self, operation: &Operation) -> Result<Pending, reward::Error> {
        let estimate = self
            .ledger
            .estimate_gas(operation)
            .await
            .map_err(|err| reward::Error::EstimationFailed {
                reason: err.reason(),
            })?;
        let gas_limit = self.policy.gas_limit(estimate);
        observe::estimated(operation, estimate, gas_limit);

        observe::stage(reward::Stage::Submitting);
        let tx = self
            .ledger
            .send(operation, gas_limit)
            .await
            .map_err(|err| {
                let tx = err.tx();
                reward::Error::network(err, tx)
            })?;
        observe::submitted(operation, tx);
        Ok(Pending { tx, gas_limit })
    }

    /// Polls for the receipt until the transaction is mined or the
    /// confirmation timeout elapses.
    pub async fn await_confirmation(&self, pending: Pending) -> Result<Receipt, reward::Error> {
        let mut last_error = None;
        let poll = async {
            loop {
                match self.ledger.receipt(pending.tx).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => last_error = None,
                    Err(err) => {
                        tracing::debug!(?err, tx = %pending.tx, "failed to fetch receipt");
                        last_error = Some(err);
                    }
                }
                tokio::time::sleep(self.policy.poll_interval).await;
            }
        };

        match tokio::time::timeout(self.policy.confirmation_timeout, poll).await {
            Ok(receipt) if receipt.success => Ok(receipt),
            Ok(receipt) => Err(reward::Error::TransactionReverted { tx: receipt.tx }),
            Err(_) => match last_error {
                Some(err) => Err(reward::Error::network(err, Some(pending.tx))),
                None => Err(reward::Error::ConfirmationTimeout {
                    tx: pending.tx,
                    timeout: self.policy.confirmation_timeout,
                }),
            },
        }
    }
}

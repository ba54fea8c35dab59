//! The quiz contract on an Ethereum compatible chain, accessed through an
//! alloy provider.

use {
    crate::{
        domain::{
            chain::{self, Ledger},
            eth,
            operation::{Operation, Receipt},
            reward,
        },
        infra::{cli, keychain},
    },
    alloy::{
        eips::eip2718::Encodable2718,
        network::{EthereumWallet, TransactionBuilder},
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::types::TransactionRequest,
        sol_types::{Revert, SolError},
        transports::{RpcError, TransportError},
    },
    self::{contracts::BasedQuiz, nonce::Nonces},
    std::{fmt, sync::Arc},
};

pub mod contracts;
mod nonce;

#[derive(Clone)]
pub struct Ethereum {
    provider: DynProvider,
    contract: BasedQuiz::BasedQuizInstance<DynProvider>,
    chain: eth::ChainId,
    url: url::Url,
    /// Only set when the owner key is loaded.
    sender: Option<Sender>,
}

/// The owner account transactions are signed and sent from.
#[derive(Clone)]
struct Sender {
    address: eth::Address,
    wallet: EthereumWallet,
    nonces: Arc<Nonces>,
}

impl Ethereum {
    /// Connects to the node at `url` and checks that it serves the expected
    /// chain.
    pub async fn connect(
        url: &url::Url,
        contract: eth::Address,
        expected: Option<eth::ChainId>,
        owner: Option<&keychain::Owner>,
    ) -> Result<Self, reward::Error> {
        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();

        let chain = provider
            .get_chain_id()
            .await
            .map(eth::ChainId)
            .map_err(|err| reward::Error::NetworkUnavailable {
                message: format!("cannot reach node: {}", classify(err, url)),
                tx: None,
            })?;
        match expected {
            Some(expected) if expected != chain => {
                return Err(reward::Error::NetworkUnavailable {
                    message: format!("node serves chain {chain}, expected {expected}"),
                    tx: None,
                });
            }
            _ => tracing::info!(%chain, "connected to node"),
        }

        Ok(Self {
            contract: BasedQuiz::new(contract, provider.clone()),
            provider,
            chain,
            url: url.clone(),
            sender: owner.map(|owner| Sender {
                address: owner.address(),
                wallet: owner.wallet(),
                nonces: Default::default(),
            }),
        })
    }

    pub fn contract(&self) -> eth::Address {
        *self.contract.address()
    }

    fn error(&self, err: TransportError) -> chain::Error {
        classify(err, &self.url)
    }

    fn contract_error(&self, err: alloy::contract::Error) -> chain::Error {
        match err {
            alloy::contract::Error::TransportError(err) => self.error(err),
            err => chain::Error::Contract {
                reason: err.to_string(),
            },
        }
    }

    fn tx(&self, operation: &Operation) -> TransactionRequest {
        let tx = TransactionRequest::default()
            .with_to(self.contract())
            .with_input(contracts::calldata(operation));
        match &self.sender {
            Some(sender) => tx.with_from(sender.address),
            None => tx,
        }
    }
}

#[async_trait::async_trait]
impl Ledger for Ethereum {
    async fn chain_id(&self) -> Result<eth::ChainId, chain::Error> {
        self.provider
            .get_chain_id()
            .await
            .map(eth::ChainId)
            .map_err(|err| self.error(err))
    }

    async fn balance(&self, account: eth::Address) -> Result<eth::Ether, chain::Error> {
        self.provider
            .get_balance(account)
            .await
            .map(eth::Ether)
            .map_err(|err| self.error(err))
    }

    async fn owner(&self) -> Result<eth::Address, chain::Error> {
        self.contract
            .owner()
            .call()
            .await
            .map_err(|err| self.contract_error(err))
    }

    async fn streak(&self, player: eth::Address) -> Result<u64, chain::Error> {
        self.contract
            .getStreak(player)
            .call()
            .await
            .map(|streak| streak.saturating_to())
            .map_err(|err| self.contract_error(err))
    }

    async fn estimate_gas(&self, operation: &Operation) -> Result<eth::Gas, chain::Error> {
        self.provider
            .estimate_gas(self.tx(operation))
            .await
            .map(eth::Gas)
            .map_err(|err| self.error(err))
    }

    async fn send(
        &self,
        operation: &Operation,
        gas_limit: eth::Gas,
    ) -> Result<eth::TxId, chain::Error> {
        let sender = self.sender.as_ref().ok_or(chain::Error::Signer)?;
        let fees = self
            .provider
            .estimate_eip1559_fees()
            .await
            .map_err(|err| self.error(err))?;
        let tx = self
            .tx(operation)
            .with_chain_id(self.chain.0)
            .with_gas_limit(gas_limit.0)
            .with_max_fee_per_gas(fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas);

        let fetch = async {
            self.provider
                .get_transaction_count(sender.address)
                .pending()
                .await
                .map_err(|err| self.error(err))
        };
        sender
            .nonces
            .with_next(fetch, |nonce| async move {
                // Signed locally so the hash is known even if the node never
                // answers the broadcast.
                let signed = tx
                    .with_nonce(nonce)
                    .build(&sender.wallet)
                    .await
                    .map_err(|err| chain::Error::Signing(err.to_string()))?;
                let id = eth::TxId(*signed.tx_hash());
                self.provider
                    .send_raw_transaction(&signed.encoded_2718())
                    .await
                    .map_err(|err| broadcast_error(err, id, &self.url))?;
                Ok::<_, chain::Error>(id)
            })
            .await
    }

    async fn receipt(&self, tx: eth::TxId) -> Result<Option<Receipt>, chain::Error> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx.0)
            .await
            .map_err(|err| self.error(err))?;
        Ok(receipt.map(|receipt| Receipt {
            tx: eth::TxId(receipt.transaction_hash),
            block: eth::BlockNo(receipt.block_number.unwrap_or_default()),
            gas_used: eth::Gas(receipt.gas_used),
            success: receipt.status(),
        }))
    }
}

impl fmt::Debug for Ethereum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ethereum")
            .field("contract", &self.contract())
            .field("chain", &self.chain)
            .field("sender", &self.sender.as_ref().map(|sender| sender.address))
            .finish()
    }
}

/// Splits RPC failures into reverts, which carry the decoded revert reason,
/// and everything else, which is a node problem. The node URL is scrubbed
/// from messages since it may embed an API key.
fn classify(err: TransportError, url: &url::Url) -> chain::Error {
    if let RpcError::ErrorResp(payload) = &err {
        if let Some(data) = payload.as_revert_data() {
            return chain::Error::Contract {
                reason: Revert::abi_decode(&data)
                    .map(|revert| revert.reason)
                    .ok()
                    .or_else(|| alloy::sol_types::decode_revert_reason(&data))
                    .unwrap_or_else(|| payload.message.to_string()),
            };
        }
        if payload.message.contains("revert") {
            return chain::Error::Contract {
                reason: payload.message.to_string(),
            };
        }
    }
    chain::Error::Node(scrub(&err.to_string(), url))
}

/// A failed broadcast of the signed transaction `tx`. An error response means
/// the node rejected it. Without one the transaction may still be out there.
fn broadcast_error(err: TransportError, tx: eth::TxId, url: &url::Url) -> chain::Error {
    match err {
        RpcError::ErrorResp(_) => classify(err, url),
        err => chain::Error::Broadcast {
            tx,
            message: scrub(&err.to_string(), url),
        },
    }
}

fn scrub(message: &str, url: &url::Url) -> String {
    message.replace(url.as_str(), &cli::redact(url))
}

use crate::domain::{chain, eth, score};

pub mod file;

/// Service configuration, assembled once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub contract: eth::Address,
    /// The chain the node is expected to serve. Not checked if `None`.
    pub chain_id: Option<eth::ChainId>,
    pub rules: score::Rules,
    pub policy: chain::Policy,
}

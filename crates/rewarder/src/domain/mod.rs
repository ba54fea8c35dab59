pub mod chain;
pub mod claim;
pub mod eth;
pub mod operation;
pub mod reward;
pub mod score;

pub use {
    claim::Claim,
    operation::Operation,
    reward::{Reward, Service},
};

pub mod blockchain;
pub mod cli;
pub mod config;
pub mod keychain;
pub mod observe;

pub use {blockchain::Ethereum, config::Config};

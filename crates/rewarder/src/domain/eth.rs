use {
    bigdecimal::BigDecimal,
    derive_more::{Display, From, Into},
};

pub use alloy::primitives::{Address, B256, U256};

/// Decimals of the native currency.
const ETHER_DECIMALS: u8 = 18;

/// Chain ID as defined by EIP-155.
///
/// https://eips.ethereum.org/EIPS/eip-155
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, From, Into)]
pub struct ChainId(pub u64);

/// An amount of native Ether denominated in wei.
#[derive(Debug, Default, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, From, Into)]
pub struct Ether(pub U256);

impl Ether {
    /// The amount in Ether, e.g. `0.001` for `10^15` wei.
    pub fn to_decimal(self) -> BigDecimal {
        number::conversions::from_base_units(self.0, ETHER_DECIMALS)
    }
}

/// Gas amount in gas units.
#[derive(Debug, Default, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, From, Into)]
pub struct Gas(pub u64);

/// A transaction hash.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct TxId(pub B256);

/// A block number.
#[derive(Debug, Default, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, From, Into)]
pub struct BlockNo(pub u64);

/// An amount of an ERC20 token in its smallest unit together with the
/// number of decimals needed to present it to humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub units: U256,
    pub decimals: u8,
}

impl TokenAmount {
    /// The human readable amount, e.g. `7.5` tokens.
    pub fn to_decimal(self) -> BigDecimal {
        number::conversions::from_base_units(self.units, self.decimals)
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

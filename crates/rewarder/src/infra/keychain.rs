use {
    crate::domain::eth,
    alloy::{network::EthereumWallet, signers::local::PrivateKeySigner},
    std::{fmt, str::FromStr},
    thiserror::Error,
};

/// The contract owner's signing key.
#[derive(Clone)]
pub struct Owner(PrivateKeySigner);

impl Owner {
    /// Derives the owner from a hex encoded private key, with or without
    /// `0x` prefix.
    pub fn load(secret: &str) -> Result<Self, Error> {
        let secret = secret.trim();
        let secret = secret.strip_prefix("0x").unwrap_or(secret);
        PrivateKeySigner::from_str(secret)
            .map(Self)
            .map_err(|_| Error::InvalidCredential)
    }

    pub fn address(&self) -> eth::Address {
        self.0.address()
    }

    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.0.clone())
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owner").field(&self.address()).finish()
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("owner private key does not derive a valid signer")]
    InvalidCredential,
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address};

    // Well known development key, never funded on a real network.
    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn derives_owner_address() {
        let expected = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(Owner::load(KEY).unwrap().address(), expected);
        assert_eq!(
            Owner::load(&format!(" 0x{KEY}\n")).unwrap().address(),
            expected
        );
    }

    #[test]
    fn rejects_garbage() {
        for secret in ["", "0x", "not a key", &KEY[..10], &"0".repeat(64)] {
            assert!(matches!(
                Owner::load(secret),
                Err(Error::InvalidCredential)
            ));
        }
    }

    #[test]
    fn debug_output_hides_key() {
        let owner = Owner::load(KEY).unwrap();
        let debug = format!("{owner:?}");
        assert!(!debug.contains(KEY));
        assert!(debug.contains("Owner(0x"));
    }
}

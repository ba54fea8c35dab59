use {
    crate::domain::{chain, eth, score},
    bigdecimal::BigDecimal,
    serde::Deserialize,
    serde_with::{DisplayFromStr, serde_as},
    std::{fmt::Debug, path::Path, time::Duration},
    tokio::fs,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Config {
    /// Address of the deployed quiz contract.
    contract_address: eth::Address,

    /// Chain the node must serve. Startup fails on a mismatch.
    chain_id: Option<u64>,

    #[serde(default)]
    reward: Reward,

    #[serde(default)]
    submission: Submission,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Reward {
    /// Tokens paid for a Based Score of 10.
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_base_reward")]
    base_reward: BigDecimal,

    /// Tokens paid for an incorrect answer.
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_participation_reward")]
    participation_reward: BigDecimal,

    #[serde(default = "default_token_decimals")]
    token_decimals: u8,
}

impl Default for Reward {
    fn default() -> Self {
        Self {
            base_reward: default_base_reward(),
            participation_reward: default_participation_reward(),
            token_decimals: default_token_decimals(),
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Submission {
    /// Minimum owner balance in ETH needed to submit transactions.
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_gas_reserve")]
    gas_reserve: BigDecimal,

    #[serde(default = "default_gas_limit_multiplier")]
    gas_limit_multiplier: u64,

    #[serde(default = "default_gas_limit_floor")]
    gas_limit_floor: u64,

    /// How long to wait for a submitted transaction to be mined.
    #[serde(with = "humantime_serde", default = "default_confirmation_timeout")]
    confirmation_timeout: Duration,

    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    confirmation_poll_interval: Duration,

    #[serde(default)]
    authorization: Authorization,
}

impl Default for Submission {
    fn default() -> Self {
        Self {
            gas_reserve: default_gas_reserve(),
            gas_limit_multiplier: default_gas_limit_multiplier(),
            gas_limit_floor: default_gas_limit_floor(),
            confirmation_timeout: default_confirmation_timeout(),
            confirmation_poll_interval: default_poll_interval(),
            authorization: Default::default(),
        }
    }
}

/// What to do when the contract owner can't be looked up.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Authorization {
    #[default]
    FailOpen,
    FailClosed,
}

fn default_base_reward() -> BigDecimal {
    BigDecimal::from(5)
}

fn default_participation_reward() -> BigDecimal {
    BigDecimal::from(1)
}

fn default_token_decimals() -> u8 {
    18
}

fn default_gas_reserve() -> BigDecimal {
    // 0.001
    BigDecimal::new(1.into(), 3)
}

fn default_gas_limit_multiplier() -> u64 {
    2
}

fn default_gas_limit_floor() -> u64 {
    200_000
}

fn default_confirmation_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

/// Load the rewarder configuration from a TOML file.
///
/// # Panics
///
/// This method panics if the config is invalid or on I/O errors.
pub async fn load(path: &Path) -> super::Config {
    let data = fs::read_to_string(path)
        .await
        .unwrap_or_else(|e| panic!("I/O error while reading {path:?}: {e:?}"));
    parse(&data, &path)
}

/// Load the rewarder configuration from a TOML string.
///
/// # Panics
///
/// This method panics if the config is invalid.
pub fn load_string(data: &str) -> super::Config {
    parse(data, &"<string>")
}

fn parse<P: Debug>(data: &str, path: &P) -> super::Config {
    let config = unwrap_or_log(toml::de::from_str::<Config>(data), path);
    assert!(
        config.submission.gas_limit_multiplier > 0,
        "invalid configuration: `gas-limit-multiplier` must be positive"
    );
    assert!(
        !config.submission.confirmation_poll_interval.is_zero(),
        "invalid configuration: `confirmation-poll-interval` must be positive"
    );

    let gas_reserve = number::conversions::to_base_units(&config.submission.gas_reserve, 18)
        .unwrap_or_else(|e| panic!("invalid configuration: `gas-reserve`: {e:?}"));

    super::Config {
        contract: config.contract_address,
        chain_id: config.chain_id.map(eth::ChainId),
        rules: score::Rules {
            base_reward: config.reward.base_reward,
            participation_reward: config.reward.participation_reward,
            token_decimals: config.reward.token_decimals,
        },
        policy: chain::Policy {
            gas_reserve: eth::Ether(gas_reserve),
            gas_limit_multiplier: config.submission.gas_limit_multiplier,
            gas_limit_floor: eth::Gas(config.submission.gas_limit_floor),
            confirmation_timeout: config.submission.confirmation_timeout,
            poll_interval: config.submission.confirmation_poll_interval,
            authorization: match config.submission.authorization {
                Authorization::FailOpen => chain::Authorization::FailOpen,
                Authorization::FailClosed => chain::Authorization::FailClosed,
            },
        },
    }
}

/// Unwraps result or logs a `TOML` parsing error.
fn unwrap_or_log<T, E, P>(result: Result<T, E>, path: &P) -> T
where
    E: Debug,
    P: Debug,
{
    result.unwrap_or_else(|err| {
        if std::env::var("TOML_TRACE_ERROR").is_ok_and(|v| v == "1") {
            panic!("failed to parse TOML config at {path:?}: {err:#?}")
        } else {
            panic!(
                "failed to parse TOML config at: {path:?}. Set TOML_TRACE_ERROR=1 to print \
                 parsing error but this may leak secrets."
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::address,
        std::{io::Write, str::FromStr},
    };

    #[test]
    fn applies_defaults() {
        let config =
            load_string(r#"contract-address = "0x5FbDB2315678afecb367f032d93F642f64180aa3""#);
        assert_eq!(
            config.contract,
            address!("5FbDB2315678afecb367f032d93F642f64180aa3")
        );
        assert_eq!(config.chain_id, None);
        assert_eq!(config.rules, score::Rules::default());

        let defaults = chain::Policy::default();
        assert_eq!(config.policy.gas_reserve, defaults.gas_reserve);
        assert_eq!(config.policy.gas_limit_multiplier, 2);
        assert_eq!(config.policy.gas_limit_floor, eth::Gas(200_000));
        assert_eq!(config.policy.confirmation_timeout, Duration::from_secs(60));
        assert_eq!(config.policy.poll_interval, Duration::from_secs(1));
        assert_eq!(config.policy.authorization, chain::Authorization::FailOpen);
    }

    #[test]
    fn reads_every_option() {
        let config = load_string(
            r#"
            contract-address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            chain-id = 8453

            [reward]
            base-reward = "2.5"
            participation-reward = "0.1"
            token-decimals = 6

            [submission]
            gas-reserve = "0.01"
            gas-limit-multiplier = 3
            gas-limit-floor = 100000
            confirmation-timeout = "2m"
            confirmation-poll-interval = "500ms"
            authorization = "fail-closed"
            "#,
        );

        assert_eq!(config.chain_id, Some(eth::ChainId(8453)));
        assert_eq!(
            config.rules,
            score::Rules {
                base_reward: BigDecimal::from_str("2.5").unwrap(),
                participation_reward: BigDecimal::from_str("0.1").unwrap(),
                token_decimals: 6,
            }
        );
        assert_eq!(
            config.policy.gas_reserve,
            eth::Ether(eth::U256::from(10_000_000_000_000_000u64))
        );
        assert_eq!(config.policy.gas_limit_multiplier, 3);
        assert_eq!(config.policy.gas_limit_floor, eth::Gas(100_000));
        assert_eq!(config.policy.confirmation_timeout, Duration::from_secs(120));
        assert_eq!(config.policy.poll_interval, Duration::from_millis(500));
        assert_eq!(
            config.policy.authorization,
            chain::Authorization::FailClosed
        );
    }

    #[test]
    #[should_panic(expected = "failed to parse TOML config")]
    fn rejects_unknown_fields() {
        load_string(
            r#"
            contract-address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            owner-private-key = "0x01"
            "#,
        );
    }

    #[tokio::test]
    async fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"contract-address = "0x5FbDB2315678afecb367f032d93F642f64180aa3""#
        )
        .unwrap();

        let config = load(file.path()).await;
        assert_eq!(
            config.contract,
            address!("5FbDB2315678afecb367f032d93F642f64180aa3")
        );
    }

    #[tokio::test]
    async fn example_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/example.toml");
        let config = load(&path).await;
        assert_eq!(config.chain_id, Some(eth::ChainId(84532)));
        assert_eq!(config.rules, score::Rules::default());
    }
}

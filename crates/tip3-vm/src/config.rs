use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;

use crate::error::SimError;
use crate::GRAM;

/// Serde adapter for u128: serialize as string, deserialize from string or integer.
/// Neither TOML nor JSON carries u128 natively, so amounts round-trip through strings.
pub mod u128_str {
    use super::*;

    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        use serde::de::{self, Visitor};
        struct U128Visitor;

        impl<'de> Visitor<'de> for U128Visitor {
            type Value = u128;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a u128 as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.trim().replace('_', "").parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                if v >= 0 {
                    Ok(v as u128)
                } else {
                    Err(E::custom("negative value for u128"))
                }
            }
        }

        d.deserialize_any(U128Visitor)
    }
}

/// Simulation parameters. Every value is in nano units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Funding of accounts created by the harness.
    #[serde(with = "u128_str")]
    pub default_balance: u128,
    #[serde(with = "u128_str")]
    pub root_deploy_value: u128,
    #[serde(with = "u128_str")]
    pub deploy_wallet_value: u128,
    #[serde(with = "u128_str")]
    pub target_root_balance: u128,
    #[serde(with = "u128_str")]
    pub target_wallet_balance: u128,
    /// Value attached to each harness call.
    #[serde(with = "u128_str")]
    pub call_value: u128,
    pub max_dispatch_steps: usize,
    /// Abort `dispatch_all` at the first failed delivery.
    pub stop_at_crash: bool,
    /// Log every delivery at info level.
    pub verbose: bool,
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimals: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            default_balance: 100 * GRAM,
            root_deploy_value: 2 * GRAM,
            deploy_wallet_value: GRAM / 10,
            target_root_balance: GRAM,
            target_wallet_balance: GRAM / 10,
            call_value: GRAM,
            max_dispatch_steps: 10_000,
            stop_at_crash: false,
            verbose: false,
            token_name: "TestToken".to_string(),
            token_symbol: "TST".to_string(),
            token_decimals: 9,
        }
    }
}

fn env_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, SimError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| SimError::Config(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

impl SimConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, SimError> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file. Missing keys take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, SimError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `TIP3_SIM_*` environment variables.
    pub fn load_from_env() -> Result<Self, SimError> {
        let mut config = SimConfig::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), SimError> {
        if let Some(v) = env_var("TIP3_SIM_DEFAULT_BALANCE")? {
            self.default_balance = v;
        }
        if let Some(v) = env_var("TIP3_SIM_ROOT_DEPLOY_VALUE")? {
            self.root_deploy_value = v;
        }
        if let Some(v) = env_var("TIP3_SIM_DEPLOY_WALLET_VALUE")? {
            self.deploy_wallet_value = v;
        }
        if let Some(v) = env_var("TIP3_SIM_TARGET_ROOT_BALANCE")? {
            self.target_root_balance = v;
        }
        if let Some(v) = env_var("TIP3_SIM_TARGET_WALLET_BALANCE")? {
            self.target_wallet_balance = v;
        }
        if let Some(v) = env_var("TIP3_SIM_CALL_VALUE")? {
            self.call_value = v;
        }
        if let Some(v) = env_var("TIP3_SIM_MAX_DISPATCH_STEPS")? {
            self.max_dispatch_steps = v;
        }
        if let Some(v) = env_var("TIP3_SIM_STOP_AT_CRASH")? {
            self.stop_at_crash = v;
        }
        if let Some(v) = env_var("TIP3_SIM_VERBOSE")? {
            self.verbose = v;
        }
        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), SimError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SimError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.max_dispatch_steps == 0 {
            return Err(SimError::Config("max_dispatch_steps must be positive".into()));
        }
        if self.deploy_wallet_value < self.target_wallet_balance {
            return Err(SimError::Config(format!(
                "deploy_wallet_value ({}) is below target_wallet_balance ({})",
                self.deploy_wallet_value, self.target_wallet_balance
            )));
        }
        Ok(())
    }

    /// Owner balance after the harness has deployed the owner's wallet.
    pub fn expected_wallet_owner_balance(&self) -> u128 {
        self.default_balance.saturating_sub(self.deploy_wallet_value)
    }
}

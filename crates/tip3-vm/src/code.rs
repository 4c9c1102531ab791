// SPDX-License-Identifier: AGPL-3.0-only
//! Code artifacts.
//!
//! Contracts are native state machines, so "code" is an identity rather than
//! bytecode: a name, the contract kind it instantiates, a version, and a
//! content hash. Code cells are looked up by name in a [`CodeRegistry`], the
//! way compiled artifacts are loaded by name from a build directory.
//!
//! | Name                           | Kind                          | Version |
//! |--------------------------------|-------------------------------|---------|
//! | `Wallet`                       | plain account                 | 1       |
//! | `TestWalletCallback`           | callback-recording account    | 1       |
//! | `TestRootTransferCallback`     | ownership-callback account    | 1       |
//! | `TokenRoot`                    | root                          | 1       |
//! | `TokenWallet`                  | wallet                        | 1       |
//! | `TokenRootUpgradeable`         | upgradeable root              | 1       |
//! | `TokenWalletUpgradeable`       | upgradeable wallet            | 1       |
//! | `TokenWalletPlatform`          | wallet address platform       | 1       |
//! | `TestTokenRootUpgradeableV2`   | upgradeable root              | 2       |
//! | `TestTokenWalletUpgradeableV2` | upgradeable wallet            | 2       |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::SimError;

pub const ACCOUNT: &str = "Wallet";
pub const WALLET_CALLBACK: &str = "TestWalletCallback";
pub const ROOT_TRANSFER_CALLBACK: &str = "TestRootTransferCallback";
pub const TOKEN_ROOT: &str = "TokenRoot";
pub const TOKEN_WALLET: &str = "TokenWallet";
pub const TOKEN_ROOT_UPGRADEABLE: &str = "TokenRootUpgradeable";
pub const TOKEN_WALLET_UPGRADEABLE: &str = "TokenWalletUpgradeable";
pub const TOKEN_WALLET_PLATFORM: &str = "TokenWalletPlatform";
pub const TOKEN_ROOT_UPGRADEABLE_V2: &str = "TestTokenRootUpgradeableV2";
pub const TOKEN_WALLET_UPGRADEABLE_V2: &str = "TestTokenWalletUpgradeableV2";

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeHash([u8; 32]);

impl CodeHash {
    pub fn of(name: &str, version: u32) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"tip3-sim/code");
        hasher.update(name.as_bytes());
        hasher.update(&version.to_be_bytes());
        CodeHash(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for CodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeHash({})", self)
    }
}

impl Serialize for CodeHash {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for CodeHash {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("code hash must be 32 bytes"))?;
        Ok(CodeHash(bytes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodeKind {
    Account,
    WalletCallback,
    RootTransferCallback,
    TokenRoot { upgradeable: bool },
    TokenWallet { upgradeable: bool },
    WalletPlatform,
}

impl CodeKind {
    pub fn is_upgradeable_root(&self) -> bool {
        matches!(self, CodeKind::TokenRoot { upgradeable: true })
    }

    pub fn is_upgradeable_wallet(&self) -> bool {
        matches!(self, CodeKind::TokenWallet { upgradeable: true })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub name: String,
    pub kind: CodeKind,
    pub version: u32,
    pub hash: CodeHash,
}

impl Code {
    pub fn new(name: &str, kind: CodeKind, version: u32) -> Self {
        Code {
            name: name.to_string(),
            kind,
            version,
            hash: CodeHash::of(name, version),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodeRegistry {
    codes: BTreeMap<String, Code>,
}

impl CodeRegistry {
    pub fn empty() -> Self {
        CodeRegistry {
            codes: BTreeMap::new(),
        }
    }

    /// Every artifact the token suite references.
    pub fn standard() -> Self {
        let mut registry = CodeRegistry::empty();
        registry.register(ACCOUNT, CodeKind::Account, 1);
        registry.register(WALLET_CALLBACK, CodeKind::WalletCallback, 1);
        registry.register(ROOT_TRANSFER_CALLBACK, CodeKind::RootTransferCallback, 1);
        registry.register(TOKEN_ROOT, CodeKind::TokenRoot { upgradeable: false }, 1);
        registry.register(TOKEN_WALLET, CodeKind::TokenWallet { upgradeable: false }, 1);
        registry.register(
            TOKEN_ROOT_UPGRADEABLE,
            CodeKind::TokenRoot { upgradeable: true },
            1,
        );
        registry.register(
            TOKEN_WALLET_UPGRADEABLE,
            CodeKind::TokenWallet { upgradeable: true },
            1,
        );
        registry.register(TOKEN_WALLET_PLATFORM, CodeKind::WalletPlatform, 1);
        registry.register(
            TOKEN_ROOT_UPGRADEABLE_V2,
            CodeKind::TokenRoot { upgradeable: true },
            2,
        );
        registry.register(
            TOKEN_WALLET_UPGRADEABLE_V2,
            CodeKind::TokenWallet { upgradeable: true },
            2,
        );
        registry
    }

    pub fn register(&mut self, name: &str, kind: CodeKind, version: u32) -> &Code {
        self.codes
            .entry(name.to_string())
            .or_insert_with(|| Code::new(name, kind, version))
    }

    pub fn load(&self, name: &str) -> Result<Code, SimError> {
        self.codes
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::UnknownCode(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Code> {
        self.codes.values()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        CodeRegistry::standard()
    }
}

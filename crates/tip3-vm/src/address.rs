//! Actor addresses.
//!
//! An address is a 256-bit account id in workchain 0, rendered as
//! `0:<64 hex digits>`. The all-zero address is the "no target" sentinel:
//! messages sent to it are dropped and their value is burned.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::code::CodeHash;

/// Only workchain 0 exists in the simulation.
pub const WORKCHAIN: i8 = 0;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 32]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("address must be `<workchain>:<hex>`")]
    MissingWorkchain,
    #[error("unsupported workchain `{0}`")]
    UnsupportedWorkchain(String),
    #[error("account id is not valid hex")]
    InvalidHex,
    #[error("account id must be 32 bytes, got {0}")]
    WrongLength(usize),
}

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Random address. Collides with a live actor only with negligible probability,
    /// which is what the bounce tests rely on.
    pub fn random() -> Self {
        Address(rand::random::<[u8; 32]>())
    }

    /// Domain-separated blake3 derivation.
    pub fn derive(domain: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain.as_bytes());
        for part in parts {
            hasher.update(&(part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        Address(*hasher.finalize().as_bytes())
    }

    /// Address of the wallet `owner` holds under `root`.
    ///
    /// `address_code` is the code the address is derived from: the wallet code
    /// itself for plain wallets, the platform code for upgradeable ones. Every
    /// party computes the same address from the same three inputs, which is how a
    /// wallet proves it belongs to a root.
    pub fn wallet(address_code: &CodeHash, root: &Address, owner: &Address) -> Self {
        Address::derive(
            "tip3-sim/wallet",
            &[address_code.as_bytes(), root.as_bytes(), owner.as_bytes()],
        )
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", WORKCHAIN, self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (workchain, id) = s
            .split_once(':')
            .ok_or(AddressParseError::MissingWorkchain)?;
        if workchain.trim() != "0" {
            return Err(AddressParseError::UnsupportedWorkchain(workchain.to_string()));
        }
        let bytes = hex::decode(id.trim()).map_err(|_| AddressParseError::InvalidHex)?;
        let len = bytes.len();
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AddressParseError::WrongLength(len))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// SPDX-License-Identifier: AGPL-3.0-only
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Contract kinds
//
// Every actor with code holds one `Contract`. Dispatch is a plain match over
// the kind; each kind keeps its own method table, bounce handler and getters.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod accounts;
pub mod root;
pub mod wallet;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::code::{Code, CodeKind};
use crate::context::Context;
use crate::error::{ContractError, SimError};
use crate::message::{ExternalCall, Method, StateInit};

pub use accounts::{OwnershipChange, RootTransferCallback, TransferRecord, WalletCallback};
pub use root::{RootParams, TokenRoot};
pub use wallet::TokenWallet;

/// Interface ids answered by `supportsInterface`.
pub mod interface {
    /// Shared by roots and wallets.
    pub const SID: u32 = 0x3204_ec29;

    pub const ROOT: &[u32] = &[
        SID,
        0x4371_d8ed,
        0x0b1f_d263,
        0x18f7_cce4,
        0x0095_b2fa,
        0x45c9_2654,
        0x1df3_85c6,
    ];

    pub const WALLET: &[u32] = &[
        0x0f02_58aa,
        SID,
        0x4f47_9fa3,
        0x2a4a_c43e,
        0x5625_48ad,
        0x0c2f_f20d,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum Contract {
    /// Plain forwarding account.
    Account,
    WalletCallback(WalletCallback),
    RootTransferCallback(RootTransferCallback),
    TokenRoot(TokenRoot),
    TokenWallet(TokenWallet),
}

impl Contract {
    /// Builds the contract a deploy message describes.
    pub fn from_state_init(init: &StateInit) -> Result<Self, ContractError> {
        match init.code.kind {
            CodeKind::TokenWallet { .. } => Ok(Contract::TokenWallet(TokenWallet::from_init(&init.data))),
            _ => Err(ContractError::IncompatibleCode),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Contract::Account => "account",
            Contract::WalletCallback(_) => "wallet_callback",
            Contract::RootTransferCallback(_) => "root_transfer_callback",
            Contract::TokenRoot(_) => "token_root",
            Contract::TokenWallet(_) => "token_wallet",
        }
    }

    pub fn as_root(&self) -> Option<&TokenRoot> {
        match self {
            Contract::TokenRoot(root) => Some(root),
            _ => None,
        }
    }

    pub fn as_wallet(&self) -> Option<&TokenWallet> {
        match self {
            Contract::TokenWallet(wallet) => Some(wallet),
            _ => None,
        }
    }

    pub(crate) fn construct(&mut self, ctx: &mut Context) -> Result<(), ContractError> {
        match self {
            Contract::TokenRoot(root) => root.construct(ctx),
            Contract::TokenWallet(wallet) => wallet.construct(ctx),
            _ => Ok(()),
        }
    }

    pub(crate) fn receive(&mut self, ctx: &mut Context, method: &Method) -> Result<(), ContractError> {
        match self {
            // accepts anything and keeps the value
            Contract::Account => Ok(()),
            Contract::WalletCallback(account) => account.receive(ctx, method),
            Contract::RootTransferCallback(account) => account.receive(ctx, method),
            Contract::TokenRoot(root) => root.receive(ctx, method),
            Contract::TokenWallet(wallet) => wallet.receive(ctx, method),
        }
    }

    pub(crate) fn on_bounce(&mut self, ctx: &mut Context, method: &Method) -> Result<(), ContractError> {
        match self {
            Contract::TokenRoot(root) => root.on_bounce(ctx, method),
            Contract::TokenWallet(wallet) => wallet.on_bounce(ctx, method),
            _ => Ok(()),
        }
    }

    pub(crate) fn external(&mut self, ctx: &mut Context, call: &ExternalCall) -> Result<(), ContractError> {
        match self {
            Contract::Account | Contract::WalletCallback(_) => accounts::send_transaction(ctx, call),
            Contract::RootTransferCallback(account) => account.external(ctx, call),
            Contract::TokenRoot(_) | Contract::TokenWallet(_) => {
                Err(ContractError::UnknownMethod("sendTransaction"))
            }
        }
    }

    /// Answers a getter. `address` and `code` are the actor's own.
    pub fn get(&self, address: &Address, code: &Code, getter: &Getter) -> Result<Value, ContractError> {
        let unknown = || ContractError::UnknownMethod(getter.name());
        match (self, getter) {
            (Contract::TokenRoot(root), getter) => match getter {
                Getter::Name => Ok(Value::Text(root.name.clone())),
                Getter::Symbol => Ok(Value::Text(root.symbol.clone())),
                Getter::Decimals => Ok(Value::U8(root.decimals)),
                Getter::TotalSupply => Ok(Value::U128(root.total_supply)),
                Getter::RootOwner => Ok(Value::Address(root.owner)),
                Getter::WalletCode => Ok(Value::Code(root.wallet_code.clone())),
                Getter::WalletOf { owner } => Ok(Value::Address(root.wallet_of(address, owner))),
                Getter::MintDisabled => Ok(Value::Bool(root.mint_disabled)),
                Getter::BurnByRootDisabled => Ok(Value::Bool(root.burn_by_root_disabled)),
                Getter::BurnPaused => Ok(Value::Bool(root.burn_paused)),
                Getter::SupportsInterface { id } => Ok(Value::Bool(root.supports_interface(*id))),
                Getter::WalletVersion if root.is_upgradeable() => Ok(Value::U32(root.wallet_version)),
                Getter::PlatformCode => root.platform_code.clone().map(Value::Code).ok_or_else(unknown),
                Getter::OnlyInV2 if code.version >= 2 => {
                    Ok(Value::Text("Some method in root v2".to_string()))
                }
                _ => Err(unknown()),
            },
            (Contract::TokenWallet(wallet), getter) => match getter {
                Getter::Root => Ok(Value::Address(wallet.root)),
                Getter::Owner => Ok(Value::Address(wallet.owner)),
                Getter::Balance => Ok(Value::U128(wallet.balance)),
                Getter::WalletCode => Ok(Value::Code(code.clone())),
                Getter::SupportsInterface { id } => Ok(Value::Bool(wallet.supports_interface(*id))),
                Getter::Version if wallet.is_upgradeable() => Ok(Value::U32(wallet.version)),
                Getter::PlatformCode => wallet.platform_code.clone().map(Value::Code).ok_or_else(unknown),
                Getter::OnlyInV2 if code.version >= 2 => {
                    Ok(Value::Text("Some method in wallet v2".to_string()))
                }
                _ => Err(unknown()),
            },
            (Contract::WalletCallback(account), Getter::Callbacks) => {
                Ok(Value::Callbacks(Box::new(account.clone())))
            }
            (Contract::RootTransferCallback(account), Getter::OwnershipCallback) => {
                Ok(Value::OwnershipChange(account.callback.clone()))
            }
            _ => Err(unknown()),
        }
    }
}

/// Read-only queries answered synchronously, outside the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "getter", rename_all = "camelCase")]
pub enum Getter {
    // root
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    RootOwner,
    WalletOf { owner: Address },
    MintDisabled,
    BurnByRootDisabled,
    BurnPaused,
    WalletVersion,
    // wallet
    Root,
    Owner,
    Balance,
    Version,
    // both
    WalletCode,
    PlatformCode,
    SupportsInterface { id: u32 },
    OnlyInV2,
    // test accounts
    Callbacks,
    OwnershipCallback,
}

impl Getter {
    pub fn name(&self) -> &'static str {
        match self {
            Getter::Name => "name",
            Getter::Symbol => "symbol",
            Getter::Decimals => "decimals",
            Getter::TotalSupply => "totalSupply",
            Getter::RootOwner => "rootOwner",
            Getter::WalletOf { .. } => "walletOf",
            Getter::MintDisabled => "mintDisabled",
            Getter::BurnByRootDisabled => "burnByRootDisabled",
            Getter::BurnPaused => "burnPaused",
            Getter::WalletVersion => "walletVersion",
            Getter::Root => "root",
            Getter::Owner => "owner",
            Getter::Balance => "balance",
            Getter::Version => "version",
            Getter::WalletCode => "walletCode",
            Getter::PlatformCode => "platformCode",
            Getter::SupportsInterface { .. } => "supportsInterface",
            Getter::OnlyInV2 => "onlyInV2",
            Getter::Callbacks => "callbacks",
            Getter::OwnershipCallback => "ownershipCallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Address(Address),
    U128(u128),
    U32(u32),
    U8(u8),
    Bool(bool),
    Text(String),
    Code(Code),
    Callbacks(Box<WalletCallback>),
    OwnershipChange(Option<OwnershipChange>),
}

macro_rules! expect_value {
    ($fn_name:ident, $variant:ident, $ty:ty, $label:literal) => {
        pub fn $fn_name(self) -> Result<$ty, SimError> {
            match self {
                Value::$variant(inner) => Ok(inner),
                other => Err(SimError::UnexpectedValue {
                    expected: $label,
                    found: other.type_name().to_string(),
                }),
            }
        }
    };
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Address(_) => "address",
            Value::U128(_) => "uint128",
            Value::U32(_) => "uint32",
            Value::U8(_) => "uint8",
            Value::Bool(_) => "bool",
            Value::Text(_) => "string",
            Value::Code(_) => "cell",
            Value::Callbacks(_) => "callbacks",
            Value::OwnershipChange(_) => "ownership callback",
        }
    }

    expect_value!(expect_address, Address, Address, "address");
    expect_value!(expect_u128, U128, u128, "uint128");
    expect_value!(expect_u32, U32, u32, "uint32");
    expect_value!(expect_u8, U8, u8, "uint8");
    expect_value!(expect_bool, Bool, bool, "bool");
    expect_value!(expect_text, Text, String, "string");
    expect_value!(expect_code, Code, Code, "cell");
    expect_value!(expect_callbacks, Callbacks, Box<WalletCallback>, "callbacks");
    expect_value!(
        expect_ownership_change,
        OwnershipChange,
        Option<OwnershipChange>,
        "ownership callback"
    );
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Address(address) => write!(f, "{}", address),
            Value::U128(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Code(code) => write!(f, "{} v{} ({})", code.name, code.version, code.hash),
            Value::Callbacks(account) => write!(f, "callbacks of root {}", account.root),
            Value::OwnershipChange(Some(change)) => {
                write!(f, "{} -> {}", change.old_owner, change.new_owner)
            }
            Value::OwnershipChange(None) => f.write_str("<none>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{CodeRegistry, TOKEN_ROOT, TOKEN_WALLET, TOKEN_WALLET_UPGRADEABLE_V2};
    use crate::context::Targets;
    use crate::message::{Payload, WalletInit};

    fn root() -> (Contract, Code) {
        let registry = CodeRegistry::standard();
        let params = RootParams {
            name: "Token".into(),
            symbol: "TKN".into(),
            decimals: 9,
            owner: Address::derive("owner", &[]),
            initial_supply_to: Address::ZERO,
            initial_supply: 0,
            deploy_wallet_value: 0,
            mint_disabled: false,
            burn_by_root_disabled: false,
            burn_paused: false,
            remaining_gas_to: Address::ZERO,
        };
        let wallet_code = registry.load(TOKEN_WALLET).unwrap();
        (
            Contract::TokenRoot(TokenRoot::new(&params, wallet_code, None)),
            registry.load(TOKEN_ROOT).unwrap(),
        )
    }

    #[test]
    fn test_root_getters() {
        let (root, code) = root();
        let address = Address::derive("root", &[]);
        let get = |g: Getter| root.get(&address, &code, &g);
        assert_eq!(get(Getter::Name).unwrap().expect_text().unwrap(), "Token");
        assert_eq!(get(Getter::Decimals).unwrap().expect_u8().unwrap(), 9);
        assert_eq!(get(Getter::TotalSupply).unwrap().expect_u128().unwrap(), 0);
        assert!(get(Getter::SupportsInterface { id: interface::SID })
            .unwrap()
            .expect_bool()
            .unwrap());
        assert!(!get(Getter::SupportsInterface { id: 0x0f02_58aa })
            .unwrap()
            .expect_bool()
            .unwrap());
    }

    #[test]
    fn test_bounced_mint_reverts_supply() {
        let (mut root, code) = root();
        if let Contract::TokenRoot(state) = &mut root {
            state.total_supply = 5;
        }
        let targets = Targets { root: 10, wallet: 1 };
        let ctx = || {
            Context::new(Address::derive("root", &[]), None, code.clone(), 1, 10, targets).unwrap()
        };
        let accept = |amount| Method::AcceptMint {
            amount,
            remaining_gas_to: Address::ZERO,
            notify: false,
            payload: Payload::empty(),
        };

        root.on_bounce(&mut ctx(), &accept(3)).unwrap();
        assert_eq!(
            root.get(&Address::ZERO, &code, &Getter::TotalSupply)
                .unwrap()
                .expect_u128()
                .unwrap(),
            2
        );
        assert_eq!(
            root.on_bounce(&mut ctx(), &accept(3)),
            Err(ContractError::IntegerOverflow)
        );
    }

    #[test]
    fn test_plain_root_hides_upgradeable_getters() {
        let (root, code) = root();
        let address = Address::derive("root", &[]);
        for getter in [Getter::WalletVersion, Getter::PlatformCode, Getter::OnlyInV2] {
            let name = getter.name();
            assert_eq!(
                root.get(&address, &code, &getter),
                Err(ContractError::UnknownMethod(name))
            );
        }
    }

    #[test]
    fn test_v2_wallet_answers_only_in_v2() {
        let registry = CodeRegistry::standard();
        let code = registry.load(TOKEN_WALLET_UPGRADEABLE_V2).unwrap();
        let init = StateInit {
            code: code.clone(),
            data: WalletInit {
                root: Address::derive("root", &[]),
                owner: Address::derive("owner", &[]),
                address_code: code.hash,
                platform_code: Some(code.clone()),
                version: 2,
            },
        };
        let wallet = Contract::from_state_init(&init).unwrap();
        let value = wallet.get(&init.address(), &code, &Getter::OnlyInV2).unwrap();
        assert_eq!(value.expect_text().unwrap(), "Some method in wallet v2");
    }

    #[test]
    fn test_expect_helpers_report_type() {
        match Value::Bool(true).expect_u128() {
            Err(SimError::UnexpectedValue { expected, found }) => {
                assert_eq!(expected, "uint128");
                assert_eq!(found, "bool");
            }
            other => panic!("expected UnexpectedValue, got {:?}", other),
        }
    }

    #[test]
    fn test_only_wallets_come_from_state_init() {
        let registry = CodeRegistry::standard();
        let code = registry.load(TOKEN_ROOT).unwrap();
        let init = StateInit {
            code: code.clone(),
            data: WalletInit {
                root: Address::ZERO,
                owner: Address::ZERO,
                address_code: code.hash,
                platform_code: None,
                version: 1,
            },
        };
        assert_eq!(
            Contract::from_state_init(&init),
            Err(ContractError::IncompatibleCode)
        );
    }
}

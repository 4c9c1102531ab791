// SPDX-License-Identifier: AGPL-3.0-only
//! # Token wallet
//!
//! Holds one owner's balance of one token. Wallets trust each other by
//! address: a wallet accepts `acceptTransfer` only from the address derived
//! for the claimed sender under the same root, and the root accepts
//! `acceptBurn` only from the wallet derived for the claimed owner.

use serde::Serialize;

use crate::address::Address;
use crate::code::{Code, CodeHash};
use crate::context::Context;
use crate::contracts::interface;
use crate::error::ContractError;
use crate::message::{Method, Payload, StateInit, WalletInit};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenWallet {
    pub root: Address,
    pub owner: Address,
    pub balance: u128,
    pub address_code: CodeHash,
    /// Present on upgradeable wallets.
    pub platform_code: Option<Code>,
    pub version: u32,
}

impl TokenWallet {
    pub fn from_init(init: &WalletInit) -> Self {
        TokenWallet {
            root: init.root,
            owner: init.owner,
            balance: 0,
            address_code: init.address_code,
            platform_code: init.platform_code.clone(),
            version: init.version,
        }
    }

    pub fn is_upgradeable(&self) -> bool {
        self.platform_code.is_some()
    }

    /// Address of the sibling wallet `owner` holds under the same root.
    pub fn wallet_of(&self, owner: &Address) -> Address {
        Address::wallet(&self.address_code, &self.root, owner)
    }

    pub fn supports_interface(&self, id: u32) -> bool {
        interface::WALLET.contains(&id)
    }

    fn only_owner(&self, ctx: &Context) -> Result<(), ContractError> {
        ctx.require_sender(&self.owner, ContractError::NotOwner)
    }

    fn only_root(&self, ctx: &Context) -> Result<(), ContractError> {
        ctx.require_sender(&self.root, ContractError::NotRoot)
    }

    fn check_spend(&self, amount: u128) -> Result<(), ContractError> {
        if amount == 0 {
            return Err(ContractError::WrongAmount);
        }
        if amount > self.balance {
            return Err(ContractError::NotEnoughBalance);
        }
        Ok(())
    }

    fn debit(&mut self, amount: u128) -> Result<(), ContractError> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(ContractError::NotEnoughBalance)?;
        Ok(())
    }

    fn credit(&mut self, amount: u128) -> Result<(), ContractError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(ContractError::IntegerOverflow)?;
        Ok(())
    }

    /// Init of a sibling wallet, carrying this wallet's own code and version.
    fn sibling_init(&self, ctx: &Context, owner: Address) -> StateInit {
        StateInit {
            code: ctx.code().clone(),
            data: WalletInit {
                root: self.root,
                owner,
                address_code: self.address_code,
                platform_code: self.platform_code.clone(),
                version: self.version,
            },
        }
    }

    pub(crate) fn construct(&mut self, _ctx: &mut Context) -> Result<(), ContractError> {
        if self.owner.is_zero() {
            return Err(ContractError::WrongWalletOwner);
        }
        Ok(())
    }

    fn burn(
        &mut self,
        ctx: &mut Context,
        amount: u128,
        remaining_gas_to: Address,
        callback_to: Address,
        payload: Payload,
    ) -> Result<(), ContractError> {
        self.check_spend(amount)?;
        ctx.reserve(ctx.targets().wallet);
        self.debit(amount)?;
        ctx.send_all_not_reserved(
            self.root,
            Method::AcceptBurn {
                amount,
                wallet_owner: self.owner,
                remaining_gas_to,
                callback_to,
                payload,
            },
            true,
        );
        Ok(())
    }

    pub(crate) fn receive(&mut self, ctx: &mut Context, method: &Method) -> Result<(), ContractError> {
        let target = ctx.targets().wallet;
        match method {
            Method::Empty => Ok(()),

            Method::Transfer {
                amount,
                recipient,
                deploy_wallet_value,
                remaining_gas_to,
                notify,
                payload,
            } => {
                self.only_owner(ctx)?;
                self.check_spend(*amount)?;
                if recipient.is_zero() || *recipient == self.owner {
                    return Err(ContractError::WrongRecipient);
                }
                ctx.reserve(target);
                let init = self.sibling_init(ctx, *recipient);
                let recipient_wallet = if *deploy_wallet_value > 0 {
                    ctx.deploy(init, *deploy_wallet_value)?
                } else {
                    init.address()
                };
                self.debit(*amount)?;
                ctx.send_all_not_reserved(
                    recipient_wallet,
                    Method::AcceptTransfer {
                        amount: *amount,
                        sender: self.owner,
                        remaining_gas_to: *remaining_gas_to,
                        notify: *notify,
                        payload: payload.clone(),
                    },
                    true,
                );
                Ok(())
            }

            Method::TransferToWallet {
                amount,
                recipient_wallet,
                remaining_gas_to,
                notify,
                payload,
            } => {
                self.only_owner(ctx)?;
                self.check_spend(*amount)?;
                if recipient_wallet.is_zero() || *recipient_wallet == ctx.address() {
                    return Err(ContractError::WrongRecipient);
                }
                ctx.reserve(target);
                self.debit(*amount)?;
                ctx.send_all_not_reserved(
                    *recipient_wallet,
                    Method::AcceptTransfer {
                        amount: *amount,
                        sender: self.owner,
                        remaining_gas_to: *remaining_gas_to,
                        notify: *notify,
                        payload: payload.clone(),
                    },
                    true,
                );
                Ok(())
            }

            Method::AcceptTransfer {
                amount,
                sender,
                remaining_gas_to,
                notify,
                payload,
            } => {
                let expected = self.wallet_of(sender);
                ctx.require_sender(&expected, ContractError::SenderIsNotValidWallet)?;
                ctx.reserve(target);
                self.credit(*amount)?;
                if *notify {
                    ctx.send_all_not_reserved(
                        self.owner,
                        Method::OnAcceptTokensTransfer {
                            token_root: self.root,
                            amount: *amount,
                            sender: *sender,
                            sender_wallet: expected,
                            remaining_gas_to: *remaining_gas_to,
                            payload: payload.clone(),
                        },
                        false,
                    );
                } else if !remaining_gas_to.is_zero() {
                    ctx.refund_all_not_reserved(*remaining_gas_to);
                }
                Ok(())
            }

            Method::AcceptMint {
                amount,
                remaining_gas_to,
                notify,
                payload,
            } => {
                self.only_root(ctx)?;
                ctx.reserve(target);
                self.credit(*amount)?;
                if *notify {
                    ctx.send_all_not_reserved(
                        self.owner,
                        Method::OnAcceptTokensMint {
                            token_root: self.root,
                            amount: *amount,
                            remaining_gas_to: *remaining_gas_to,
                            payload: payload.clone(),
                        },
                        false,
                    );
                } else if !remaining_gas_to.is_zero() && *remaining_gas_to != ctx.address() {
                    ctx.refund_all_not_reserved(*remaining_gas_to);
                }
                Ok(())
            }

            Method::Burn {
                amount,
                remaining_gas_to,
                callback_to,
                payload,
            } => {
                self.only_owner(ctx)?;
                self.burn(ctx, *amount, *remaining_gas_to, *callback_to, payload.clone())
            }

            Method::BurnByRoot {
                amount,
                remaining_gas_to,
                callback_to,
                payload,
            } => {
                self.only_root(ctx)?;
                self.burn(ctx, *amount, *remaining_gas_to, *callback_to, payload.clone())
            }

            Method::Destroy { remaining_gas_to } => {
                self.only_owner(ctx)?;
                if self.balance != 0 {
                    return Err(ContractError::NonEmptyBalance);
                }
                ctx.send_all_and_destroy(*remaining_gas_to);
                Ok(())
            }

            Method::UpgradeWallet { remaining_gas_to } => {
                if !self.is_upgradeable() {
                    return Err(ContractError::UnknownMethod("upgrade"));
                }
                self.only_owner(ctx)?;
                ctx.reserve(target);
                ctx.send_all_not_reserved(
                    self.root,
                    Method::RequestUpgradeWallet {
                        current_version: self.version,
                        wallet_owner: self.owner,
                        remaining_gas_to: *remaining_gas_to,
                    },
                    false,
                );
                Ok(())
            }

            Method::AcceptUpgrade {
                code,
                version,
                remaining_gas_to,
            } => {
                if !self.is_upgradeable() {
                    return Err(ContractError::UnknownMethod("acceptUpgrade"));
                }
                self.only_root(ctx)?;
                ctx.reserve(target);
                if *version != self.version {
                    self.version = *version;
                    ctx.set_code(code.clone());
                }
                if !remaining_gas_to.is_zero() {
                    ctx.refund_all_not_reserved(*remaining_gas_to);
                }
                Ok(())
            }

            other => Err(ContractError::UnknownMethod(other.name())),
        }
    }

    /// Returns tokens that never arrived and tells the owner why.
    pub(crate) fn on_bounce(&mut self, ctx: &mut Context, method: &Method) -> Result<(), ContractError> {
        match method {
            Method::AcceptTransfer { amount, .. } => {
                ctx.reserve(ctx.targets().wallet);
                self.credit(*amount)?;
                // the bounce comes from the wallet that rejected (or never held) the tokens
                let reverted_from = ctx.sender().unwrap_or(Address::ZERO);
                ctx.send_all_not_reserved(
                    self.owner,
                    Method::OnBounceTokensTransfer {
                        token_root: self.root,
                        amount: *amount,
                        reverted_from,
                    },
                    false,
                );
                Ok(())
            }
            Method::AcceptBurn { amount, .. } => {
                ctx.reserve(ctx.targets().wallet);
                self.credit(*amount)?;
                ctx.send_all_not_reserved(
                    self.owner,
                    Method::OnBounceTokensBurn {
                        token_root: self.root,
                        amount: *amount,
                    },
                    false,
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{
        CodeKind, CodeRegistry, TOKEN_WALLET, TOKEN_WALLET_PLATFORM, TOKEN_WALLET_UPGRADEABLE,
        TOKEN_WALLET_UPGRADEABLE_V2,
    };
    use crate::context::Targets;

    const TARGETS: Targets = Targets {
        root: 1_000,
        wallet: 100,
    };

    fn wallet(balance: u128) -> (TokenWallet, Code) {
        let code = CodeRegistry::standard().load(TOKEN_WALLET).unwrap();
        let mut wallet = TokenWallet::from_init(&WalletInit {
            root: Address::derive("root", &[]),
            owner: Address::derive("owner", &[]),
            address_code: code.hash,
            platform_code: None,
            version: 1,
        });
        wallet.balance = balance;
        (wallet, code)
    }

    fn ctx(code: &Code, sender: Address, value: u128) -> Context {
        Context::new(
            Address::derive("wallet", &[]),
            Some(sender),
            code.clone(),
            value,
            TARGETS.wallet,
            TARGETS,
        )
        .unwrap()
    }

    fn transfer(amount: u128, recipient: Address) -> Method {
        Method::Transfer {
            amount,
            recipient,
            deploy_wallet_value: 0,
            remaining_gas_to: Address::ZERO,
            notify: false,
            payload: Payload::empty(),
        }
    }

    #[test]
    fn test_transfer_checks_run_in_order() {
        let (mut w, code) = wallet(10);
        let owner = w.owner;
        let bob = Address::derive("bob", &[]);
        let stranger = Address::derive("stranger", &[]);
        assert_eq!(
            w.receive(&mut ctx(&code, stranger, 1_000), &transfer(1, bob)),
            Err(ContractError::NotOwner)
        );
        assert_eq!(
            w.receive(&mut ctx(&code, owner, 1_000), &transfer(0, bob)),
            Err(ContractError::WrongAmount)
        );
        assert_eq!(
            w.receive(&mut ctx(&code, owner, 1_000), &transfer(11, bob)),
            Err(ContractError::NotEnoughBalance)
        );
        assert_eq!(
            w.receive(&mut ctx(&code, owner, 1_000), &transfer(1, owner)),
            Err(ContractError::WrongRecipient)
        );
        assert_eq!(w.balance, 10);
    }

    #[test]
    fn test_transfer_debits_and_sends_everything_unreserved() {
        let (mut w, code) = wallet(10);
        let owner = w.owner;
        let bob = Address::derive("bob", &[]);
        let mut ctx = ctx(&code, owner, 1_000);
        w.receive(&mut ctx, &transfer(4, bob)).unwrap();
        assert_eq!(w.balance, 6);
        let effects = ctx.into_effects();
        assert_eq!(effects.balance, TARGETS.wallet);
        assert_eq!(effects.outbox.len(), 1);
        assert_eq!(effects.outbox[0].dst, w.wallet_of(&bob));
        assert_eq!(effects.outbox[0].value, 1_000);
        assert!(effects.outbox[0].bounce);
    }

    #[test]
    fn test_transfer_with_deploy_sends_deploy_first() {
        let (mut w, code) = wallet(10);
        let owner = w.owner;
        let bob = Address::derive("bob", &[]);
        let mut ctx = ctx(&code, owner, 1_000);
        let method = Method::Transfer {
            amount: 1,
            recipient: bob,
            deploy_wallet_value: 100,
            remaining_gas_to: owner,
            notify: false,
            payload: Payload::empty(),
        };
        w.receive(&mut ctx, &method).unwrap();
        let effects = ctx.into_effects();
        assert_eq!(effects.outbox.len(), 2);
        assert_eq!(effects.outbox[0].body, Method::Constructor);
        assert_eq!(effects.outbox[0].value, 100);
        assert!(effects.outbox[0].state_init.is_some());
        assert_eq!(effects.outbox[1].body.name(), "acceptTransfer");
        assert_eq!(effects.outbox[1].value, 900);
        assert_eq!(effects.outbox[0].dst, effects.outbox[1].dst);
    }

    #[test]
    fn test_accept_transfer_rejects_foreign_sender() {
        let (mut w, code) = wallet(0);
        let bob = Address::derive("bob", &[]);
        let method = Method::AcceptTransfer {
            amount: 5,
            sender: bob,
            remaining_gas_to: Address::ZERO,
            notify: false,
            payload: Payload::empty(),
        };
        assert_eq!(
            w.receive(&mut ctx(&code, bob, 10), &method),
            Err(ContractError::SenderIsNotValidWallet)
        );
        let sibling = w.wallet_of(&bob);
        w.receive(&mut ctx(&code, sibling, 10), &method).unwrap();
        assert_eq!(w.balance, 5);
    }

    #[test]
    fn test_accept_upgrade_installs_newer_code() {
        let registry = CodeRegistry::standard();
        let code = registry.load(TOKEN_WALLET_UPGRADEABLE).unwrap();
        let platform = registry.load(TOKEN_WALLET_PLATFORM).unwrap();
        let v2 = registry.load(TOKEN_WALLET_UPGRADEABLE_V2).unwrap();
        let mut w = TokenWallet::from_init(&WalletInit {
            root: Address::derive("root", &[]),
            owner: Address::derive("owner", &[]),
            address_code: platform.hash,
            platform_code: Some(platform),
            version: 1,
        });
        let root = w.root;
        let owner = w.owner;
        let upgrade = |version| Method::AcceptUpgrade {
            code: v2.clone(),
            version,
            remaining_gas_to: owner,
        };

        assert_eq!(
            w.receive(&mut ctx(&code, owner, 10), &upgrade(2)),
            Err(ContractError::NotRoot)
        );

        let mut same = ctx(&code, root, 10);
        w.receive(&mut same, &upgrade(1)).unwrap();
        assert!(same.into_effects().new_code.is_none());

        let mut newer = ctx(&code, root, 10);
        w.receive(&mut newer, &upgrade(2)).unwrap();
        assert_eq!(w.version, 2);
        let effects = newer.into_effects();
        assert_eq!(effects.new_code, Some(v2));
        assert_eq!(effects.outbox[0].dst, owner);
        assert_eq!(effects.outbox[0].value, 10);
    }

    #[test]
    fn test_destroy_requires_empty_balance() {
        let (mut w, code) = wallet(1);
        let owner = w.owner;
        let method = Method::Destroy {
            remaining_gas_to: owner,
        };
        assert_eq!(
            w.receive(&mut ctx(&code, owner, 10), &method),
            Err(ContractError::NonEmptyBalance)
        );
        w.balance = 0;
        let mut ctx = ctx(&code, owner, 10);
        w.receive(&mut ctx, &method).unwrap();
        let effects = ctx.into_effects();
        assert!(effects.destroy);
        assert_eq!(effects.outbox[0].value, TARGETS.wallet + 10);
    }

    #[test]
    fn test_bounced_burn_restores_balance() {
        let (mut w, code) = wallet(90);
        let root = w.root;
        let mut ctx = ctx(&code, root, 1_000);
        let bounced = Method::AcceptBurn {
            amount: 10,
            wallet_owner: w.owner,
            remaining_gas_to: w.owner,
            callback_to: Address::ZERO,
            payload: Payload::empty(),
        };
        w.on_bounce(&mut ctx, &bounced).unwrap();
        assert_eq!(w.balance, 100);
        let effects = ctx.into_effects();
        assert_eq!(effects.outbox[0].dst, w.owner);
        assert_eq!(effects.outbox[0].body.name(), "onBounceTokensBurn");
    }

    #[test]
    fn test_upgrade_methods_need_upgradeable_wallet() {
        let (mut w, code) = wallet(0);
        let owner = w.owner;
        assert_eq!(
            w.receive(
                &mut ctx(&code, owner, 10),
                &Method::UpgradeWallet {
                    remaining_gas_to: owner
                }
            ),
            Err(ContractError::UnknownMethod("upgrade"))
        );
        assert_eq!(code.kind, CodeKind::TokenWallet { upgradeable: false });
    }
}

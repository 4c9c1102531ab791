// SPDX-License-Identifier: AGPL-3.0-only
//! # Token root
//!
//! The supply ledger of one token. The root never holds balances itself: it
//! records `total_supply`, deploys wallets at derived addresses and talks to
//! them by message.
//!
//! ```text
//!   owner ──mint──▶ root ──acceptMint──▶ wallet ──(notify)──▶ wallet owner
//!   owner ──burnTokens──▶ root ──burnByRoot──▶ wallet ──acceptBurn──▶ root
//!   owner ──burn──▶ wallet ──acceptBurn──▶ root ──(callback)──▶ callbackTo
//! ```
//!
//! Supply is raised before `acceptMint` leaves and lowered only when
//! `acceptBurn` arrives, so it matches the sum of wallet balances once the
//! queue has drained. Bounced `acceptMint` messages undo the increase.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::code::Code;
use crate::context::Context;
use crate::contracts::interface;
use crate::error::ContractError;
use crate::message::{Answer, Callback, Method, Payload, StateInit, WalletInit};

/// Constructor arguments of a token root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Address,
    pub initial_supply_to: Address,
    pub initial_supply: u128,
    pub deploy_wallet_value: u128,
    pub mint_disabled: bool,
    pub burn_by_root_disabled: bool,
    pub burn_paused: bool,
    pub remaining_gas_to: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRoot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Address,
    pub total_supply: u128,
    pub wallet_code: Code,
    /// Present on upgradeable roots.
    pub platform_code: Option<Code>,
    pub wallet_version: u32,
    pub mint_disabled: bool,
    pub burn_by_root_disabled: bool,
    pub burn_paused: bool,
    #[serde(skip)]
    pending_mint: Option<PendingMint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingMint {
    amount: u128,
    recipient: Address,
    deploy_wallet_value: u128,
    remaining_gas_to: Address,
}

impl TokenRoot {
    pub fn new(params: &RootParams, wallet_code: Code, platform_code: Option<Code>) -> Self {
        let pending_mint = if !params.initial_supply_to.is_zero() && params.initial_supply > 0 {
            Some(PendingMint {
                amount: params.initial_supply,
                recipient: params.initial_supply_to,
                deploy_wallet_value: params.deploy_wallet_value,
                remaining_gas_to: params.remaining_gas_to,
            })
        } else {
            None
        };
        TokenRoot {
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            decimals: params.decimals,
            owner: params.owner,
            total_supply: 0,
            wallet_code,
            platform_code,
            wallet_version: 1,
            mint_disabled: params.mint_disabled,
            burn_by_root_disabled: params.burn_by_root_disabled,
            burn_paused: params.burn_paused,
            pending_mint,
        }
    }

    pub fn is_upgradeable(&self) -> bool {
        self.platform_code.is_some()
    }

    /// Hash wallet addresses are derived from.
    fn address_code(&self) -> crate::code::CodeHash {
        self.platform_code
            .as_ref()
            .map_or(self.wallet_code.hash, |platform| platform.hash)
    }

    pub fn wallet_of(&self, root: &Address, owner: &Address) -> Address {
        Address::wallet(&self.address_code(), root, owner)
    }

    pub fn supports_interface(&self, id: u32) -> bool {
        interface::ROOT.contains(&id)
    }

    fn wallet_init(&self, root: Address, owner: Address) -> StateInit {
        StateInit {
            code: self.wallet_code.clone(),
            data: WalletInit {
                root,
                owner,
                address_code: self.address_code(),
                platform_code: self.platform_code.clone(),
                version: self.wallet_version,
            },
        }
    }

    fn only_owner(&self, ctx: &Context) -> Result<(), ContractError> {
        ctx.require_sender(&self.owner, ContractError::NotOwner)
    }

    fn only_wallet(&self, ctx: &Context, wallet_owner: &Address) -> Result<(), ContractError> {
        let expected = self.wallet_of(&ctx.address(), wallet_owner);
        ctx.require_sender(&expected, ContractError::SenderIsNotValidWallet)
    }

    fn only_upgradeable(&self, method: &'static str) -> Result<(), ContractError> {
        if self.is_upgradeable() {
            Ok(())
        } else {
            Err(ContractError::UnknownMethod(method))
        }
    }

    /// Runs once when the root is deployed. Mints the initial supply, if any.
    pub(crate) fn construct(&mut self, ctx: &mut Context) -> Result<(), ContractError> {
        let Some(pending) = self.pending_mint.take() else {
            return Ok(());
        };
        ctx.reserve(ctx.targets().root);
        self.mint_to(
            ctx,
            pending.amount,
            pending.recipient,
            pending.deploy_wallet_value,
            pending.remaining_gas_to,
            false,
            Payload::empty(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn mint_to(
        &mut self,
        ctx: &mut Context,
        amount: u128,
        recipient: Address,
        deploy_wallet_value: u128,
        remaining_gas_to: Address,
        notify: bool,
        payload: Payload,
    ) -> Result<(), ContractError> {
        let init = self.wallet_init(ctx.address(), recipient);
        let wallet = if deploy_wallet_value > 0 {
            ctx.deploy(init, deploy_wallet_value)?
        } else {
            init.address()
        };
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(ContractError::IntegerOverflow)?;
        let accept = Method::AcceptMint {
            amount,
            remaining_gas_to,
            notify,
            payload,
        };
        ctx.send_all_not_reserved(wallet, accept, true);
        Ok(())
    }

    pub(crate) fn receive(&mut self, ctx: &mut Context, method: &Method) -> Result<(), ContractError> {
        let target = ctx.targets().root;
        match method {
            Method::Empty => Ok(()),

            Method::Mint {
                amount,
                recipient,
                deploy_wallet_value,
                remaining_gas_to,
                notify,
                payload,
            } => {
                self.only_owner(ctx)?;
                if self.mint_disabled {
                    return Err(ContractError::MintDisabled);
                }
                if *amount == 0 {
                    return Err(ContractError::WrongAmount);
                }
                if recipient.is_zero() {
                    return Err(ContractError::WrongRecipient);
                }
                ctx.reserve(target);
                self.mint_to(
                    ctx,
                    *amount,
                    *recipient,
                    *deploy_wallet_value,
                    *remaining_gas_to,
                    *notify,
                    payload.clone(),
                )
            }

            Method::BurnTokens {
                amount,
                wallet_owner,
                remaining_gas_to,
                callback_to,
                payload,
            } => {
                self.only_owner(ctx)?;
                if self.burn_by_root_disabled {
                    return Err(ContractError::BurnByRootDisabled);
                }
                if *amount == 0 {
                    return Err(ContractError::WrongAmount);
                }
                ctx.reserve(target);
                let wallet = self.wallet_of(&ctx.address(), wallet_owner);
                ctx.send_all_not_reserved(
                    wallet,
                    Method::BurnByRoot {
                        amount: *amount,
                        remaining_gas_to: *remaining_gas_to,
                        callback_to: *callback_to,
                        payload: payload.clone(),
                    },
                    true,
                );
                Ok(())
            }

            Method::AcceptBurn {
                amount,
                wallet_owner,
                remaining_gas_to,
                callback_to,
                payload,
            } => {
                self.only_wallet(ctx, wallet_owner)?;
                if self.burn_paused {
                    return Err(ContractError::BurnPaused);
                }
                ctx.reserve(target);
                self.total_supply = self
                    .total_supply
                    .checked_sub(*amount)
                    .ok_or(ContractError::IntegerOverflow)?;
                if callback_to.is_zero() {
                    if !remaining_gas_to.is_zero() {
                        ctx.refund_all_not_reserved(*remaining_gas_to);
                    }
                } else {
                    let wallet = ctx.sender().unwrap_or(Address::ZERO);
                    ctx.send_all_not_reserved(
                        *callback_to,
                        Method::OnAcceptTokensBurn {
                            amount: *amount,
                            wallet_owner: *wallet_owner,
                            wallet,
                            remaining_gas_to: *remaining_gas_to,
                            payload: payload.clone(),
                        },
                        false,
                    );
                }
                Ok(())
            }

            Method::SetBurnPaused { paused } => {
                self.only_owner(ctx)?;
                ctx.reserve(target);
                self.burn_paused = *paused;
                self.answer(ctx, Answer::BurnPaused { paused: *paused });
                Ok(())
            }

            Method::DisableMint => {
                self.only_owner(ctx)?;
                ctx.reserve(target);
                self.mint_disabled = true;
                self.answer(ctx, Answer::MintDisabled { disabled: true });
                Ok(())
            }

            Method::DisableBurnByRoot => {
                self.only_owner(ctx)?;
                ctx.reserve(target);
                self.burn_by_root_disabled = true;
                self.answer(ctx, Answer::BurnByRootDisabled { disabled: true });
                Ok(())
            }

            Method::DeployWallet {
                wallet_owner,
                deploy_wallet_value,
            } => {
                if wallet_owner.is_zero() {
                    return Err(ContractError::WrongWalletOwner);
                }
                ctx.reserve(target);
                let init = self.wallet_init(ctx.address(), *wallet_owner);
                let wallet = ctx.deploy(init, *deploy_wallet_value)?;
                self.answer(ctx, Answer::WalletDeployed { wallet });
                Ok(())
            }

            Method::SendSurplusGas { to } => {
                self.only_owner(ctx)?;
                ctx.reserve_exact(target);
                ctx.refund_all_not_reserved(*to);
                Ok(())
            }

            Method::TransferOwnership {
                new_owner,
                remaining_gas_to,
                callbacks,
            } => {
                self.only_owner(ctx)?;
                ctx.reserve(target);
                let old_owner = self.owner;
                self.owner = *new_owner;
                self.notify_ownership(ctx, old_owner, *remaining_gas_to, callbacks)
            }

            Method::Upgrade { code } => {
                self.only_upgradeable("upgrade")?;
                self.only_owner(ctx)?;
                if !code.kind.is_upgradeable_root() {
                    return Err(ContractError::IncompatibleCode);
                }
                ctx.reserve(target);
                ctx.set_code(code.clone());
                if let Some(sender) = ctx.sender() {
                    ctx.refund_all_not_reserved(sender);
                }
                Ok(())
            }

            Method::SetWalletCode { code } => {
                self.only_upgradeable("setWalletCode")?;
                self.only_owner(ctx)?;
                if !code.kind.is_upgradeable_wallet() {
                    return Err(ContractError::IncompatibleCode);
                }
                ctx.reserve(target);
                self.wallet_code = code.clone();
                self.wallet_version = self
                    .wallet_version
                    .checked_add(1)
                    .ok_or(ContractError::IntegerOverflow)?;
                if let Some(sender) = ctx.sender() {
                    ctx.refund_all_not_reserved(sender);
                }
                Ok(())
            }

            Method::RequestUpgradeWallet {
                current_version,
                wallet_owner,
                remaining_gas_to,
            } => {
                self.only_upgradeable("requestUpgradeWallet")?;
                self.only_wallet(ctx, wallet_owner)?;
                ctx.reserve(target);
                if *current_version == self.wallet_version {
                    ctx.refund_all_not_reserved(*remaining_gas_to);
                } else {
                    let wallet = self.wallet_of(&ctx.address(), wallet_owner);
                    ctx.send_all_not_reserved(
                        wallet,
                        Method::AcceptUpgrade {
                            code: self.wallet_code.clone(),
                            version: self.wallet_version,
                            remaining_gas_to: *remaining_gas_to,
                        },
                        false,
                    );
                }
                Ok(())
            }

            other => Err(ContractError::UnknownMethod(other.name())),
        }
    }

    /// One message per callback entry. The entry addressed to `remaining_gas_to`
    /// is merged with the refund and carries everything left over.
    fn notify_ownership(
        &self,
        ctx: &mut Context,
        old_owner: Address,
        remaining_gas_to: Address,
        callbacks: &[Callback],
    ) -> Result<(), ContractError> {
        let mut gas_owner_payload: Option<Payload> = None;
        for callback in callbacks.iter().filter(|c| !c.dest.is_zero()) {
            let body = Method::OnTransferTokenRootOwnership {
                old_owner,
                new_owner: self.owner,
                remaining_gas_to,
                payload: callback.payload.clone(),
            };
            if callback.dest == remaining_gas_to {
                gas_owner_payload = Some(callback.payload.clone());
            } else {
                ctx.send(callback.dest, callback.value, body, false)?;
            }
        }
        if remaining_gas_to.is_zero() {
            return Ok(());
        }
        match gas_owner_payload {
            Some(payload) => ctx.send_all_not_reserved(
                remaining_gas_to,
                Method::OnTransferTokenRootOwnership {
                    old_owner,
                    new_owner: self.owner,
                    remaining_gas_to,
                    payload,
                },
                false,
            ),
            None => ctx.refund_all_not_reserved(remaining_gas_to),
        }
        Ok(())
    }

    fn answer(&self, ctx: &mut Context, answer: Answer) {
        if let Some(sender) = ctx.sender() {
            ctx.send_all_not_reserved(sender, Method::Answer(answer), false);
        }
    }

    pub(crate) fn on_bounce(&mut self, _ctx: &mut Context, method: &Method) -> Result<(), ContractError> {
        if let Method::AcceptMint { amount, .. } = method {
            self.total_supply = self
                .total_supply
                .checked_sub(*amount)
                .ok_or(ContractError::IntegerOverflow)?;
        }
        Ok(())
    }
}

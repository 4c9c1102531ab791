//! Externally driven accounts: the plain forwarding account and the two test
//! accounts that record the callbacks they receive.

use serde::Serialize;

use crate::address::Address;
use crate::context::Context;
use crate::error::ContractError;
use crate::message::{Answer, ExternalCall, Method, Payload};

/// `sendTransaction`, shared by every account kind.
pub(crate) fn send_transaction(
    ctx: &mut Context,
    call: &ExternalCall,
) -> Result<(), ContractError> {
    match call {
        ExternalCall::SendTransaction {
            dest,
            value,
            bounce,
            body,
        } => ctx.send(*dest, *value, body.clone(), *bounce),
        ExternalCall::SetRoot { .. } => Err(ContractError::UnknownMethod("setRoot")),
    }
}

/// Hands the inbound value on to `remaining_gas_to`, the way the test callbacks
/// return gas to whoever paid for the operation.
fn forward_value(ctx: &mut Context, remaining_gas_to: &Address) -> Result<(), ContractError> {
    if remaining_gas_to.is_zero() || *remaining_gas_to == ctx.address() {
        return Ok(());
    }
    let value = ctx.value();
    ctx.send(*remaining_gas_to, value, Method::Empty, false)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    pub amount: u128,
    pub sender: Address,
    pub sender_wallet: Address,
    pub remaining_gas_to: Address,
    pub payload: Payload,
}

/// State of a `TestWalletCallback` account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletCallback {
    pub root: Address,
    pub wallet: Option<Address>,
    pub minted: bool,
    pub minted_amount: u128,
    pub minted_payload: Option<Payload>,
    pub transfer: Option<TransferRecord>,
    pub burned: bool,
    pub burned_amount: u128,
    pub burned_payload: Option<Payload>,
    pub burned_bounced: bool,
    pub bounced: bool,
    pub bounced_amount: u128,
    pub bounced_from: Option<Address>,
}

impl WalletCallback {
    pub fn new(root: Address) -> Self {
        WalletCallback {
            root,
            wallet: None,
            minted: false,
            minted_amount: 0,
            minted_payload: None,
            transfer: None,
            burned: false,
            burned_amount: 0,
            burned_payload: None,
            burned_bounced: false,
            bounced: false,
            bounced_amount: 0,
            bounced_from: None,
        }
    }

    pub(crate) fn receive(&mut self, ctx: &mut Context, method: &Method) -> Result<(), ContractError> {
        match method {
            Method::Answer(Answer::WalletDeployed { wallet }) => {
                self.wallet = Some(*wallet);
                Ok(())
            }
            Method::OnAcceptTokensMint {
                amount,
                remaining_gas_to,
                payload,
                ..
            } => {
                self.minted = true;
                self.minted_amount = *amount;
                self.minted_payload = Some(payload.clone());
                forward_value(ctx, remaining_gas_to)
            }
            Method::OnAcceptTokensTransfer {
                amount,
                sender,
                sender_wallet,
                remaining_gas_to,
                payload,
                ..
            } => {
                self.transfer = Some(TransferRecord {
                    amount: *amount,
                    sender: *sender,
                    sender_wallet: *sender_wallet,
                    remaining_gas_to: *remaining_gas_to,
                    payload: payload.clone(),
                });
                forward_value(ctx, remaining_gas_to)
            }
            Method::OnAcceptTokensBurn {
                amount,
                remaining_gas_to,
                payload,
                ..
            } => {
                self.burned = true;
                self.burned_amount = *amount;
                self.burned_payload = Some(payload.clone());
                forward_value(ctx, remaining_gas_to)
            }
            Method::OnBounceTokensTransfer {
                amount,
                reverted_from,
                ..
            } => {
                self.bounced = true;
                self.bounced_amount = *amount;
                self.bounced_from = Some(*reverted_from);
                Ok(())
            }
            Method::OnBounceTokensBurn { amount, .. } => {
                self.burned_bounced = true;
                self.burned_amount = *amount;
                Ok(())
            }
            // plain value and unrelated answers are simply kept
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnershipChange {
    pub old_owner: Address,
    pub new_owner: Address,
    pub remaining_gas_to: Address,
    pub payload: Payload,
}

/// State of a `TestRootTransferCallback` account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RootTransferCallback {
    pub root: Option<Address>,
    pub callback: Option<OwnershipChange>,
}

impl RootTransferCallback {
    pub(crate) fn external(&mut self, ctx: &mut Context, call: &ExternalCall) -> Result<(), ContractError> {
        match call {
            ExternalCall::SetRoot { root } => {
                self.root = Some(*root);
                Ok(())
            }
            other => send_transaction(ctx, other),
        }
    }

    pub(crate) fn receive(&mut self, ctx: &mut Context, method: &Method) -> Result<(), ContractError> {
        match method {
            Method::OnTransferTokenRootOwnership {
                old_owner,
                new_owner,
                remaining_gas_to,
                payload,
            } => {
                match &self.root {
                    Some(root) if ctx.is_sender(root) => {}
                    _ => return Err(ContractError::NotRoot),
                }
                self.callback = Some(OwnershipChange {
                    old_owner: *old_owner,
                    new_owner: *new_owner,
                    remaining_gas_to: *remaining_gas_to,
                    payload: payload.clone(),
                });
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

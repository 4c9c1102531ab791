//! Execution context of one handler invocation.
//!
//! A handler never touches the registry. It reads the inbound message through
//! the [`Context`] and records outbound actions on it; the dispatcher applies
//! them only when the handler returns `Ok`.
//!
//! Value accounting follows the token standard's reserve discipline:
//!
//! ```text
//!   balance      = balance before the message + inbound value
//!   reserve(t)   = min(balance, max(balance before the message, t))
//!   available    = balance - reserved
//!   send(v)      : requires v <= available
//!   send ANR     : sends everything available ("all not reserved")
//! ```

use crate::address::Address;
use crate::code::Code;
use crate::error::ContractError;
use crate::message::{Method, StateInit};

/// Balances the contracts keep for themselves between messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    pub root: u128,
    pub wallet: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub dst: Address,
    pub value: u128,
    pub body: Method,
    pub bounce: bool,
    pub state_init: Option<StateInit>,
}

#[derive(Debug)]
pub struct Context {
    address: Address,
    sender: Option<Address>,
    code: Code,
    value: u128,
    balance_before: u128,
    balance: u128,
    reserved: u128,
    targets: Targets,
    outbox: Vec<Outbound>,
    new_code: Option<Code>,
    destroy: bool,
}

impl Context {
    pub(crate) fn new(
        address: Address,
        sender: Option<Address>,
        code: Code,
        value: u128,
        balance_before: u128,
        targets: Targets,
    ) -> Result<Self, ContractError> {
        let balance = balance_before
            .checked_add(value)
            .ok_or(ContractError::IntegerOverflow)?;
        Ok(Context {
            address,
            sender,
            code,
            value,
            balance_before,
            balance,
            reserved: 0,
            targets,
            outbox: Vec::new(),
            new_code: None,
            destroy: false,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `None` for external calls.
    pub fn sender(&self) -> Option<Address> {
        self.sender
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn value(&self) -> u128 {
        self.value
    }

    pub fn balance(&self) -> u128 {
        self.balance
    }

    pub fn targets(&self) -> Targets {
        self.targets
    }

    pub fn is_sender(&self, expected: &Address) -> bool {
        self.sender.as_ref() == Some(expected)
    }

    pub fn require_sender(
        &self,
        expected: &Address,
        error: ContractError,
    ) -> Result<(), ContractError> {
        if self.is_sender(expected) {
            Ok(())
        } else {
            Err(error)
        }
    }

    /// Keep at least `target`, and never less than what was held before this message.
    pub fn reserve(&mut self, target: u128) {
        self.reserved = self.balance_before.max(target).min(self.balance);
    }

    /// Keep exactly `amount`, releasing anything held above it.
    pub fn reserve_exact(&mut self, amount: u128) {
        self.reserved = amount.min(self.balance);
    }

    pub fn available(&self) -> u128 {
        self.balance.saturating_sub(self.reserved)
    }

    pub fn send(
        &mut self,
        dst: Address,
        value: u128,
        body: Method,
        bounce: bool,
    ) -> Result<(), ContractError> {
        self.push(dst, value, body, bounce, None)
    }

    /// Sends everything above the reservation.
    pub fn send_all_not_reserved(&mut self, dst: Address, body: Method, bounce: bool) {
        let value = self.available();
        self.balance -= value;
        self.outbox.push(Outbound {
            dst,
            value,
            body,
            bounce,
            state_init: None,
        });
    }

    /// Plain non-bounceable refund of everything above the reservation.
    pub fn refund_all_not_reserved(&mut self, dst: Address) {
        self.send_all_not_reserved(dst, Method::Empty, false);
    }

    /// Deploys `init` with `value` attached and returns the new address. The
    /// deploy message precedes anything sent afterwards in this handler.
    pub fn deploy(&mut self, init: StateInit, value: u128) -> Result<Address, ContractError> {
        let dst = init.address();
        self.push(dst, value, Method::Constructor, true, Some(init))?;
        Ok(dst)
    }

    /// Sends the whole balance to `dst` and removes this actor afterwards.
    pub fn send_all_and_destroy(&mut self, dst: Address) {
        let value = self.balance;
        self.balance = 0;
        self.reserved = 0;
        self.outbox.push(Outbound {
            dst,
            value,
            body: Method::Empty,
            bounce: false,
            state_init: None,
        });
        self.destroy = true;
    }

    pub fn set_code(&mut self, code: Code) {
        self.code = code.clone();
        self.new_code = Some(code);
    }

    fn push(
        &mut self,
        dst: Address,
        value: u128,
        body: Method,
        bounce: bool,
        state_init: Option<StateInit>,
    ) -> Result<(), ContractError> {
        let available = self.available();
        if value > available {
            return Err(ContractError::NotEnoughFunds {
                requested: value,
                available,
            });
        }
        self.balance -= value;
        self.outbox.push(Outbound {
            dst,
            value,
            body,
            bounce,
            state_init,
        });
        Ok(())
    }

    pub(crate) fn into_effects(self) -> Effects {
        Effects {
            balance: self.balance,
            outbox: self.outbox,
            new_code: self.new_code,
            destroy: self.destroy,
        }
    }
}

/// What a successful handler leaves behind.
#[derive(Debug)]
pub(crate) struct Effects {
    pub balance: u128,
    pub outbox: Vec<Outbound>,
    pub new_code: Option<Code>,
    pub destroy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::CodeKind;

    const TARGETS: Targets = Targets {
        root: 1_000,
        wallet: 100,
    };

    fn ctx(value: u128, balance_before: u128) -> Context {
        Context::new(
            Address::derive("self", &[]),
            Some(Address::derive("sender", &[])),
            Code::new("Wallet", CodeKind::Account, 1),
            value,
            balance_before,
            TARGETS,
        )
        .unwrap()
    }

    #[test]
    fn test_reserve_keeps_previous_balance() {
        let mut ctx = ctx(500, 2_000);
        ctx.reserve(TARGETS.root);
        assert_eq!(ctx.available(), 500);
    }

    #[test]
    fn test_reserve_tops_up_to_target() {
        let mut ctx = ctx(500, 50);
        ctx.reserve(TARGETS.wallet);
        assert_eq!(ctx.available(), 450);
    }

    #[test]
    fn test_reserve_is_capped_by_balance() {
        let mut ctx = ctx(10, 0);
        ctx.reserve(TARGETS.root);
        assert_eq!(ctx.available(), 0);
    }

    #[test]
    fn test_send_respects_reservation() {
        let mut ctx = ctx(500, 100);
        ctx.reserve(TARGETS.wallet);
        let dst = Address::derive("dst", &[]);
        assert!(ctx.send(dst, 200, Method::Empty, false).is_ok());
        assert_eq!(
            ctx.send(dst, 400, Method::Empty, false),
            Err(ContractError::NotEnoughFunds {
                requested: 400,
                available: 300
            })
        );
        ctx.send_all_not_reserved(dst, Method::Empty, false);
        let effects = ctx.into_effects();
        assert_eq!(effects.balance, 100);
        let values: Vec<u128> = effects.outbox.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![200, 300]);
    }

    #[test]
    fn test_second_anr_send_is_empty() {
        let mut ctx = ctx(300, 100);
        ctx.reserve(TARGETS.wallet);
        let dst = Address::derive("dst", &[]);
        ctx.refund_all_not_reserved(dst);
        ctx.refund_all_not_reserved(dst);
        let effects = ctx.into_effects();
        assert_eq!(effects.outbox[0].value, 300);
        assert_eq!(effects.outbox[1].value, 0);
    }

    #[test]
    fn test_destroy_sends_everything() {
        let mut ctx = ctx(300, 100);
        ctx.reserve(TARGETS.wallet);
        ctx.send_all_and_destroy(Address::derive("dst", &[]));
        let effects = ctx.into_effects();
        assert!(effects.destroy);
        assert_eq!(effects.balance, 0);
        assert_eq!(effects.outbox[0].value, 400);
    }

    #[test]
    fn test_overflowing_credit_is_rejected() {
        let result = Context::new(
            Address::ZERO,
            None,
            Code::new("Wallet", CodeKind::Account, 1),
            u128::MAX,
            1,
            TARGETS,
        );
        assert_eq!(result.err(), Some(ContractError::IntegerOverflow));
    }
}

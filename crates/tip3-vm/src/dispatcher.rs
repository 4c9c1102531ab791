// SPDX-License-Identifier: AGPL-3.0-only
//! Message delivery.
//!
//! One delivery is a transaction over the destination actor:
//!
//! 1. credit the inbound value,
//! 2. run the handler on a copy of the contract state,
//! 3. on success commit the copy, the balance left after sends and the outbox.
//!
//! A failed bounceable message leaves the destination untouched and is reflected
//! to its sender. A failed non-bounceable message leaves its value behind.

use log::{log, warn, Level};
use serde::Serialize;

use crate::context::{Context, Effects};
use crate::contracts::Contract;
use crate::error::{ContractError, ExitCode, SimError, SUCCESS};
use crate::message::{Message, MessageId, Method, StateInit};
use crate::registry::Actor;
use crate::Simulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No active contract at the destination. `bounced` tells whether the
    /// value went back to the sender or was parked on an uninit actor.
    NoContract { bounced: bool },
    /// Destination is the zero address; the value is burned.
    ZeroAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failed { exit_code: ExitCode, bounced: bool },
    Skipped { reason: SkipReason },
}

impl Outcome {
    /// `None` for deliveries that never reached a handler.
    pub fn exit_code(&self) -> Option<ExitCode> {
        match self {
            Outcome::Success => Some(SUCCESS),
            Outcome::Failed { exit_code, .. } => Some(*exit_code),
            Outcome::Skipped { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Log record of one delivered message.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub message: Message,
    pub outcome: Outcome,
    pub emitted: Vec<MessageId>,
}

fn is_deploy(message: &Message) -> bool {
    message.state_init.is_some() || matches!(message.body, Method::Constructor)
}

fn execute(
    contract: &mut Contract,
    ctx: &mut Context,
    message: &Message,
) -> Result<(), ContractError> {
    if message.bounced {
        contract.on_bounce(ctx, &message.body)
    } else if is_deploy(message) {
        Err(ContractError::ConstructorAlreadyCalled)
    } else {
        contract.receive(ctx, &message.body)
    }
}

fn construct(
    contract: &mut Contract,
    ctx: &mut Context,
    message: &Message,
) -> Result<(), ContractError> {
    contract.construct(ctx)?;
    match message.body {
        Method::Constructor | Method::Empty => Ok(()),
        ref body => contract.receive(ctx, body),
    }
}

impl Simulator {
    /// Delivers the head of the queue.
    ///
    /// With `expect` set, the delivery must end with that exit code (`Some(0)`
    /// means success); a skipped delivery or an empty queue never matches. The
    /// step stays applied when the expectation fails. A delivery that errors
    /// changes nothing and leaves the message at the head of the queue.
    pub fn dispatch_one(&mut self, expect: Option<ExitCode>) -> Result<Option<Outcome>, SimError> {
        let Some(message) = self.queue.peek().cloned() else {
            return match expect {
                Some(expected) => Err(SimError::TestIntegrityMismatch {
                    expected,
                    actual: None,
                    message: None,
                }),
                None => Ok(None),
            };
        };

        let (outcome, emitted) = self.deliver(&message)?;
        self.queue.pop();
        let level = if self.config.verbose {
            Level::Info
        } else {
            Level::Debug
        };
        log!(
            level,
            "deliver {} {} -> {} {} value={} {:?}",
            message.id,
            message.src,
            message.dst,
            message.body.name(),
            message.value,
            outcome
        );

        let id = message.id;
        self.transactions.push(Transaction {
            message,
            outcome,
            emitted,
        });

        if let Some(expected) = expect {
            if outcome.exit_code() != Some(expected) {
                return Err(SimError::TestIntegrityMismatch {
                    expected,
                    actual: outcome.exit_code(),
                    message: Some(id),
                });
            }
        }
        Ok(Some(outcome))
    }

    /// Drains the queue and returns the number of deliveries.
    pub fn dispatch_all(&mut self) -> Result<usize, SimError> {
        let limit = self.config.max_dispatch_steps;
        let mut steps = 0;
        while !self.queue.is_empty() {
            if steps >= limit {
                return Err(SimError::DispatchLimit(limit));
            }
            let outcome = self.dispatch_one(None)?;
            steps += 1;
            if let (true, Some(Outcome::Failed { exit_code, .. })) = (self.config.stop_at_crash, outcome) {
                let message = self
                    .transactions
                    .last()
                    .map_or(MessageId(0), |tx| tx.message.id);
                return Err(SimError::UnexpectedFailure { message, exit_code });
            }
        }
        Ok(steps)
    }

    /// Delivers `index` messages without expectations, then one that must end
    /// with `expected`, then drains the rest.
    pub fn dispatch_with_exception(&mut self, expected: ExitCode, index: usize) -> Result<(), SimError> {
        for _ in 0..index {
            self.dispatch_one(None)?;
        }
        self.dispatch_one(Some(expected))?;
        self.dispatch_all()?;
        Ok(())
    }

    fn deliver(&mut self, message: &Message) -> Result<(Outcome, Vec<MessageId>), SimError> {
        if message.dst.is_zero() {
            self.record_burned(message.value)?;
            if message.value > 0 {
                warn!("{} to the zero address: {} burned", message.id, message.value);
            }
            return Ok((
                Outcome::Skipped {
                    reason: SkipReason::ZeroAddress,
                },
                Vec::new(),
            ));
        }

        let active = self
            .registry
            .get(&message.dst)
            .and_then(|actor| match (&actor.code, &actor.contract) {
                (Some(code), Some(contract)) => Some((code.clone(), contract.clone(), actor.balance)),
                _ => None,
            });

        match (active, &message.state_init) {
            (Some((code, contract, balance_before)), _) => {
                self.deliver_to_contract(message, code, contract, balance_before)
            }
            (None, Some(init)) if init.address() == message.dst => self.deliver_deploy(message, init),
            (None, _) => self.deliver_to_empty(message),
        }
    }

    fn deliver_to_contract(
        &mut self,
        message: &Message,
        code: crate::code::Code,
        mut contract: Contract,
        balance_before: u128,
    ) -> Result<(Outcome, Vec<MessageId>), SimError> {
        let result = Context::new(
            message.dst,
            Some(message.src),
            code.clone(),
            message.value,
            balance_before,
            self.targets(),
        )
        .and_then(|mut ctx| {
            execute(&mut contract, &mut ctx, message)?;
            Ok(ctx.into_effects())
        });
        self.settle(message, code, contract, result)
    }

    fn deliver_deploy(
        &mut self,
        message: &Message,
        init: &StateInit,
    ) -> Result<(Outcome, Vec<MessageId>), SimError> {
        // value parked on an uninit actor joins the new contract
        let parked = self.registry.balance(&message.dst).unwrap_or(0);
        let code = init.code.clone();
        let result = Contract::from_state_init(init).and_then(|mut contract| {
            let mut ctx = Context::new(
                message.dst,
                Some(message.src),
                code.clone(),
                message.value,
                parked,
                self.targets(),
            )?;
            construct(&mut contract, &mut ctx, message)?;
            Ok((contract, ctx.into_effects()))
        });
        match result {
            Ok((contract, effects)) => {
                log::info!("deployed {} at {} by {}", code.name, message.dst, message.src);
                let emitted = self.commit(message.dst, code, contract, effects);
                Ok((Outcome::Success, emitted))
            }
            Err(err) => self.fail(message, err),
        }
    }

    fn deliver_to_empty(&mut self, message: &Message) -> Result<(Outcome, Vec<MessageId>), SimError> {
        if message.bounce && !message.bounced {
            warn!(
                "{} {}: no contract at {}, bouncing",
                message.id,
                message.body.name(),
                message.dst
            );
            let id = self.enqueue_bounce(message);
            return Ok((
                Outcome::Skipped {
                    reason: SkipReason::NoContract { bounced: true },
                },
                vec![id],
            ));
        }
        self.registry.credit(message.dst, message.value)?;
        Ok((
            Outcome::Skipped {
                reason: SkipReason::NoContract { bounced: false },
            },
            Vec::new(),
        ))
    }

    fn settle(
        &mut self,
        message: &Message,
        code: crate::code::Code,
        contract: Contract,
        result: Result<Effects, ContractError>,
    ) -> Result<(Outcome, Vec<MessageId>), SimError> {
        match result {
            Ok(effects) => {
                let emitted = self.commit(message.dst, code, contract, effects);
                Ok((Outcome::Success, emitted))
            }
            Err(err) => self.fail(message, err),
        }
    }

    /// Discards the handler's work. Bounceable messages go back to the sender
    /// with their value; anything else leaves the value at the destination.
    fn fail(
        &mut self,
        message: &Message,
        err: ContractError,
    ) -> Result<(Outcome, Vec<MessageId>), SimError> {
        let exit_code = err.exit_code();
        if message.bounce && !message.bounced {
            warn!(
                "{} {} at {} failed with {} ({}), bouncing",
                message.id,
                message.body.name(),
                message.dst,
                exit_code,
                err
            );
            let id = self.enqueue_bounce(message);
            return Ok((
                Outcome::Failed {
                    exit_code,
                    bounced: true,
                },
                vec![id],
            ));
        }
        warn!(
            "{} {} at {} failed with {} ({})",
            message.id,
            message.body.name(),
            message.dst,
            exit_code,
            err
        );
        match self.registry.get_mut(&message.dst) {
            Some(actor) => {
                actor.balance = actor
                    .balance
                    .checked_add(message.value)
                    .ok_or_else(|| SimError::InvariantViolated("balance overflow".into()))?;
            }
            None => self.registry.put(Actor::uninit(message.dst, message.value)),
        }
        Ok((
            Outcome::Failed {
                exit_code,
                bounced: false,
            },
            Vec::new(),
        ))
    }
}

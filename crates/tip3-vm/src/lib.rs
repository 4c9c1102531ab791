// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIP-3 SIMULATOR - MESSAGE DISPATCH ENGINE
//
// Deterministic actor/message simulator for TIP-3 fungible tokens.
// - Actor registry with native balances and contract state
// - FIFO message queue with bounce semantics
// - Native token root, wallet and callback-account contracts
// - Harness wrappers, scenario runner and invariant checks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use log::info;

pub mod address;
pub mod code;
pub mod config;
pub mod context;
pub mod contracts;
pub mod dispatcher;
pub mod error;
pub mod harness;
pub mod invariants;
pub mod message;
pub mod registry;
pub mod scenario;

pub use address::Address;
pub use code::{Code, CodeHash, CodeKind, CodeRegistry};
pub use config::SimConfig;
pub use context::{Context, Outbound, Targets};
pub use contracts::{Contract, Getter, RootParams, Value};
pub use dispatcher::{Outcome, SkipReason, Transaction};
pub use error::{ContractError, ErrorKind, ExitCode, SimError};
pub use message::{ExternalCall, Message, MessageId, MessageQueue, Method, Payload};
pub use registry::{Actor, ActorRegistry};

use context::Effects;
use contracts::{RootTransferCallback, TokenRoot, WalletCallback};

/// One gram in nano units.
pub const GRAM: u128 = 1_000_000_000;

/// Constructor arguments for contracts deployed from outside the simulation.
#[derive(Debug, Clone)]
pub enum ConstructorArgs {
    None,
    WalletCallback { root: Address },
    RootTransferCallback,
    TokenRoot(RootParams),
}

impl ConstructorArgs {
    fn name(&self) -> &'static str {
        match self {
            ConstructorArgs::None => "no",
            ConstructorArgs::WalletCallback { .. } => "wallet callback",
            ConstructorArgs::RootTransferCallback => "root transfer callback",
            ConstructorArgs::TokenRoot(_) => "token root",
        }
    }
}

/// The owning context of one simulation.
///
/// Holds every actor, the pending queue and the transaction log. There is no
/// global state: two simulators never observe each other.
#[derive(Debug)]
pub struct Simulator {
    config: SimConfig,
    codes: CodeRegistry,
    registry: ActorRegistry,
    queue: MessageQueue,
    transactions: Vec<Transaction>,
    next_message_id: u64,
    deploy_nonce: u64,
    minted: u128,
    burned: u128,
}

impl Default for Simulator {
    fn default() -> Self {
        Simulator::new(SimConfig::default())
    }
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        Simulator::with_codes(config, CodeRegistry::standard())
    }

    pub fn with_codes(config: SimConfig, codes: CodeRegistry) -> Self {
        Simulator {
            config,
            codes,
            registry: ActorRegistry::new(),
            queue: MessageQueue::new(),
            transactions: Vec::new(),
            next_message_id: 1,
            deploy_nonce: 0,
            minted: 0,
            burned: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn codes(&self) -> &CodeRegistry {
        &self.codes
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn targets(&self) -> Targets {
        Targets {
            root: self.config.target_root_balance,
            wallet: self.config.target_wallet_balance,
        }
    }

    /// Loads a code artifact by name.
    pub fn load_code(&self, name: &str) -> Result<Code, SimError> {
        self.codes.load(name)
    }

    pub fn balance(&self, address: &Address) -> Option<u128> {
        self.registry.balance(address)
    }

    pub fn actor(&self, address: &Address) -> Option<&Actor> {
        self.registry.get(address)
    }

    pub fn contract(&self, address: &Address) -> Option<&Contract> {
        self.registry.get(address).and_then(|a| a.contract.as_ref())
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn pending(&self) -> &MessageQueue {
        &self.queue
    }

    /// Native value brought into the simulation from outside.
    pub fn minted(&self) -> u128 {
        self.minted
    }

    /// Native value sent to the zero address.
    pub fn burned(&self) -> u128 {
        self.burned
    }

    fn next_id(&mut self) -> MessageId {
        let id = MessageId(self.next_message_id);
        self.next_message_id += 1;
        id
    }

    /// Appends a message from `src` to the tail of the queue.
    pub fn enqueue(&mut self, src: Address, out: Outbound) -> MessageId {
        let id = self.next_id();
        log::trace!(
            "enqueue {} {} -> {} {} value={} bounce={}",
            id,
            src,
            out.dst,
            out.body.name(),
            out.value,
            out.bounce
        );
        self.queue.push(Message {
            id,
            src,
            dst: out.dst,
            value: out.value,
            body: out.body,
            bounce: out.bounce,
            bounced: false,
            state_init: out.state_init,
        });
        id
    }

    /// Reflects a failed message back to its sender with the same value and body.
    pub(crate) fn enqueue_bounce(&mut self, message: &Message) -> MessageId {
        let id = self.next_id();
        self.queue.push(Message {
            id,
            src: message.dst,
            dst: message.src,
            value: message.value,
            body: message.body.clone(),
            bounce: false,
            bounced: true,
            state_init: None,
        });
        id
    }

    pub(crate) fn record_burned(&mut self, value: u128) -> Result<(), SimError> {
        self.burned = self
            .burned
            .checked_add(value)
            .ok_or_else(|| SimError::InvariantViolated("burned value overflow".into()))?;
        Ok(())
    }

    /// Stores the outcome of a successful handler run and enqueues its outbox.
    pub(crate) fn commit(
        &mut self,
        address: Address,
        code: Code,
        contract: Contract,
        effects: Effects,
    ) -> Vec<MessageId> {
        if effects.destroy {
            info!("{} destroyed", address);
            self.registry.remove(&address);
        } else {
            let code = effects.new_code.unwrap_or(code);
            self.registry
                .put(Actor::active(address, effects.balance, code, contract));
        }
        effects
            .outbox
            .into_iter()
            .map(|out| self.enqueue(address, out))
            .collect()
    }

    fn instantiate(&self, code: &Code, args: ConstructorArgs) -> Result<Contract, SimError> {
        let mismatch = |args: &ConstructorArgs| SimError::ConstructorMismatch {
            code: code.name.clone(),
            args: args.name(),
        };
        match (code.kind, args) {
            (CodeKind::Account, ConstructorArgs::None) => Ok(Contract::Account),
            (CodeKind::WalletCallback, ConstructorArgs::WalletCallback { root }) => {
                Ok(Contract::WalletCallback(WalletCallback::new(root)))
            }
            (CodeKind::RootTransferCallback, ConstructorArgs::RootTransferCallback) => {
                Ok(Contract::RootTransferCallback(RootTransferCallback::default()))
            }
            (CodeKind::TokenRoot { upgradeable }, ConstructorArgs::TokenRoot(params)) => {
                let (wallet_code, platform_code) = if upgradeable {
                    (
                        self.codes.load(code::TOKEN_WALLET_UPGRADEABLE)?,
                        Some(self.codes.load(code::TOKEN_WALLET_PLATFORM)?),
                    )
                } else {
                    (self.codes.load(code::TOKEN_WALLET)?, None)
                };
                Ok(Contract::TokenRoot(TokenRoot::new(
                    &params,
                    wallet_code,
                    platform_code,
                )))
            }
            (_, args) => Err(mismatch(&args)),
        }
    }

    /// Deploys `code_name` funded with `value` and runs its constructor
    /// synchronously. Messages the constructor sends are enqueued.
    pub fn deploy(
        &mut self,
        code_name: &str,
        args: ConstructorArgs,
        value: u128,
    ) -> Result<Address, SimError> {
        let code = self.codes.load(code_name)?;
        let mut contract = self.instantiate(&code, args)?;
        let nonce = self.deploy_nonce;
        self.deploy_nonce += 1;
        let address = Address::derive(
            "tip3-sim/deploy",
            &[&nonce.to_be_bytes(), code.hash.as_bytes()],
        );
        if self.registry.is_active(&address) {
            return Err(SimError::AddressCollision(address));
        }

        let mut ctx = Context::new(address, None, code.clone(), value, 0, self.targets())?;
        contract.construct(&mut ctx)?;
        self.minted = self
            .minted
            .checked_add(value)
            .ok_or_else(|| SimError::InvariantViolated("minted value overflow".into()))?;
        let effects = ctx.into_effects();
        self.registry.insert(Actor::active(
            address,
            effects.balance,
            code.clone(),
            contract,
        ))?;
        for out in effects.outbox {
            self.enqueue(address, out);
        }
        info!("deployed {} at {} with {}", code.name, address, value);
        Ok(address)
    }

    /// Runs an external (unsigned) call on `address` synchronously and returns
    /// the ids of the messages it sent.
    pub fn call_external(
        &mut self,
        address: Address,
        call: ExternalCall,
    ) -> Result<Vec<MessageId>, SimError> {
        let actor = self
            .registry
            .get(&address)
            .filter(|a| a.is_active())
            .ok_or(SimError::NoContract(address))?;
        let (Some(code), Some(mut contract)) = (actor.code.clone(), actor.contract.clone()) else {
            return Err(SimError::NoContract(address));
        };
        let mut ctx = Context::new(address, None, code.clone(), 0, actor.balance, self.targets())?;
        contract.external(&mut ctx, &call)?;
        Ok(self.commit(address, code, contract, ctx.into_effects()))
    }

    /// `sendTransaction` from the account at `from`: debits it and enqueues
    /// `method` to `to` with `value` attached.
    pub fn call(
        &mut self,
        from: Address,
        to: Address,
        method: Method,
        value: u128,
        bounce: bool,
    ) -> Result<MessageId, SimError> {
        let call = ExternalCall::SendTransaction {
            dest: to,
            value,
            bounce,
            body: method,
        };
        self.call_external(from, call)?
            .into_iter()
            .next()
            .ok_or_else(|| SimError::InvariantViolated("sendTransaction sent nothing".into()))
    }

    pub fn get(&self, address: &Address, getter: Getter) -> Result<Value, SimError> {
        let actor = self
            .registry
            .get(address)
            .ok_or(SimError::NoContract(*address))?;
        match (&actor.code, &actor.contract) {
            (Some(code), Some(contract)) => Ok(contract.get(address, code, &getter)?),
            _ => Err(SimError::NoContract(*address)),
        }
    }
}

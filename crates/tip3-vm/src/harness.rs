// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HARNESS - typed handles over a Simulator
//
// - Deployer: creates funded accounts, roots and wallets
// - Account / Root / Wallet: copyable handles that send calls through
//   their owner's account and read state through getters
// - CallOpts: expected exit code of the first delivery, and whether to drain
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use log::info;

use crate::address::Address;
use crate::code;
use crate::contracts::{Getter, OwnershipChange, RootParams, WalletCallback};
use crate::error::{ExitCode, SimError, SUCCESS};
use crate::message::{Callback, ExternalCall, MessageId, Method, Payload};
use crate::{ConstructorArgs, Simulator, GRAM};

/// How a harness call is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOpts {
    /// Exit code the first delivery must end with.
    pub expect_ec: ExitCode,
    /// Deliver the message and drain the queue right away.
    pub dispatch: bool,
}

impl Default for CallOpts {
    fn default() -> Self {
        CallOpts {
            expect_ec: SUCCESS,
            dispatch: true,
        }
    }
}

impl CallOpts {
    pub fn expect(expect_ec: ExitCode) -> Self {
        CallOpts {
            expect_ec,
            dispatch: true,
        }
    }

    /// Leave the message queued.
    pub fn deferred() -> Self {
        CallOpts {
            expect_ec: SUCCESS,
            dispatch: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────

/// An externally driven account: a plain `Wallet` or one of the callback
/// accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
}

impl Account {
    pub fn balance(&self, sim: &Simulator) -> Option<u128> {
        sim.balance(&self.address)
    }

    /// Sends `method` to `to` with `value` attached, bounceable.
    pub fn send_call(
        &self,
        sim: &mut Simulator,
        to: &Address,
        method: Method,
        value: u128,
        opts: CallOpts,
    ) -> Result<MessageId, SimError> {
        let id = sim.call(self.address, *to, method, value, true)?;
        if opts.dispatch {
            sim.dispatch_one(Some(opts.expect_ec))?;
            sim.dispatch_all()?;
        }
        Ok(id)
    }

    /// Plain value transfer.
    pub fn send_transaction(
        &self,
        sim: &mut Simulator,
        dest: &Address,
        value: u128,
        bounce: bool,
        opts: CallOpts,
    ) -> Result<MessageId, SimError> {
        let id = sim.call(self.address, *dest, Method::Empty, value, bounce)?;
        if opts.dispatch {
            sim.dispatch_one(Some(opts.expect_ec))?;
            sim.dispatch_all()?;
        }
        Ok(id)
    }

    /// Recorded callbacks of a `TestWalletCallback` account.
    pub fn callbacks(&self, sim: &Simulator) -> Result<WalletCallback, SimError> {
        Ok(*sim.get(&self.address, Getter::Callbacks)?.expect_callbacks()?)
    }

    /// Last ownership notification of a `TestRootTransferCallback` account.
    pub fn ownership_callback(&self, sim: &Simulator) -> Result<Option<OwnershipChange>, SimError> {
        sim.get(&self.address, Getter::OwnershipCallback)?
            .expect_ownership_change()
    }

    pub fn set_root(&self, sim: &mut Simulator, root: &Address) -> Result<(), SimError> {
        sim.call_external(self.address, ExternalCall::SetRoot { root: *root })?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// Call builders
// ─────────────────────────────────────────────────────────────

/// `mint` arguments. `remaining_gas_to` defaults to the root owner.
#[derive(Debug, Clone)]
pub struct Mint {
    pub amount: u128,
    pub recipient: Address,
    pub deploy_wallet_value: u128,
    pub remaining_gas_to: Option<Address>,
    pub notify: bool,
    pub payload: Payload,
    pub opts: CallOpts,
}

impl Mint {
    pub fn new(amount: u128, recipient: Address) -> Self {
        Mint {
            amount,
            recipient,
            deploy_wallet_value: 0,
            remaining_gas_to: None,
            notify: false,
            payload: Payload::empty(),
            opts: CallOpts::default(),
        }
    }

    pub fn deploy_wallet_value(mut self, value: u128) -> Self {
        self.deploy_wallet_value = value;
        self
    }

    pub fn remaining_gas_to(mut self, address: Address) -> Self {
        self.remaining_gas_to = Some(address);
        self
    }

    pub fn notify(mut self, payload: Payload) -> Self {
        self.notify = true;
        self.payload = payload;
        self
    }

    pub fn expect(mut self, expect_ec: ExitCode) -> Self {
        self.opts.expect_ec = expect_ec;
        self
    }
}

/// `burnTokens` arguments.
#[derive(Debug, Clone)]
pub struct BurnTokens {
    pub amount: u128,
    pub wallet_owner: Address,
    pub remaining_gas_to: Option<Address>,
    pub callback_to: Address,
    pub payload: Payload,
    pub opts: CallOpts,
}

impl BurnTokens {
    pub fn new(amount: u128, wallet_owner: Address) -> Self {
        BurnTokens {
            amount,
            wallet_owner,
            remaining_gas_to: None,
            callback_to: Address::ZERO,
            payload: Payload::empty(),
            opts: CallOpts::default(),
        }
    }

    pub fn callback(mut self, callback_to: Address, payload: Payload) -> Self {
        self.callback_to = callback_to;
        self.payload = payload;
        self
    }

    pub fn expect(mut self, expect_ec: ExitCode) -> Self {
        self.opts.expect_ec = expect_ec;
        self
    }

    pub fn deferred(mut self) -> Self {
        self.opts.dispatch = false;
        self
    }
}

/// `transfer` arguments. `remaining_gas_to` defaults to the wallet owner.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub amount: u128,
    pub recipient: Address,
    pub deploy_wallet_value: u128,
    pub remaining_gas_to: Option<Address>,
    pub notify: bool,
    pub payload: Payload,
    pub opts: CallOpts,
}

impl Transfer {
    pub fn new(amount: u128, recipient: Address) -> Self {
        Transfer {
            amount,
            recipient,
            deploy_wallet_value: 0,
            remaining_gas_to: None,
            notify: false,
            payload: Payload::empty(),
            opts: CallOpts::default(),
        }
    }

    pub fn deploy_wallet_value(mut self, value: u128) -> Self {
        self.deploy_wallet_value = value;
        self
    }

    pub fn remaining_gas_to(mut self, address: Address) -> Self {
        self.remaining_gas_to = Some(address);
        self
    }

    pub fn notify(mut self, payload: Payload) -> Self {
        self.notify = true;
        self.payload = payload;
        self
    }

    pub fn expect(mut self, expect_ec: ExitCode) -> Self {
        self.opts.expect_ec = expect_ec;
        self
    }

    pub fn deferred(mut self) -> Self {
        self.opts.dispatch = false;
        self
    }
}

/// Wallet `burn` arguments.
#[derive(Debug, Clone)]
pub struct Burn {
    pub amount: u128,
    pub remaining_gas_to: Option<Address>,
    pub callback_to: Address,
    pub payload: Payload,
    pub opts: CallOpts,
}

impl Burn {
    pub fn new(amount: u128) -> Self {
        Burn {
            amount,
            remaining_gas_to: None,
            callback_to: Address::ZERO,
            payload: Payload::empty(),
            opts: CallOpts::default(),
        }
    }

    pub fn callback(mut self, callback_to: Address, payload: Payload) -> Self {
        self.callback_to = callback_to;
        self.payload = payload;
        self
    }

    pub fn expect(mut self, expect_ec: ExitCode) -> Self {
        self.opts.expect_ec = expect_ec;
        self
    }

    pub fn deferred(mut self) -> Self {
        self.opts.dispatch = false;
        self
    }
}

// ─────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Root {
    pub address: Address,
    pub owner: Account,
}

impl Root {
    pub fn get(&self, sim: &Simulator, getter: Getter) -> Result<crate::Value, SimError> {
        sim.get(&self.address, getter)
    }

    pub fn balance(&self, sim: &Simulator) -> Option<u128> {
        sim.balance(&self.address)
    }

    pub fn total_supply(&self, sim: &Simulator) -> Result<u128, SimError> {
        self.get(sim, Getter::TotalSupply)?.expect_u128()
    }

    pub fn owner_address(&self, sim: &Simulator) -> Result<Address, SimError> {
        self.get(sim, Getter::RootOwner)?.expect_address()
    }

    pub fn wallet_address(&self, sim: &Simulator, owner: &Address) -> Result<Address, SimError> {
        self.get(sim, Getter::WalletOf { owner: *owner })?
            .expect_address()
    }

    /// Handle of `owner`'s wallet. Fails when the wallet was never deployed.
    pub fn wallet_of(&self, sim: &Simulator, owner: &Account) -> Result<Wallet, SimError> {
        let address = self.wallet_address(sim, &owner.address)?;
        match sim.contract(&address).and_then(|c| c.as_wallet()) {
            Some(_) => Ok(Wallet {
                address,
                owner: *owner,
                root: self.address,
            }),
            None => Err(SimError::NoContract(address)),
        }
    }

    /// Sends `method` from the owner with the configured call value.
    pub fn call(&self, sim: &mut Simulator, method: Method, opts: CallOpts) -> Result<MessageId, SimError> {
        let value = sim.config().call_value;
        self.owner.send_call(sim, &self.address, method, value, opts)
    }

    pub fn mint(&self, sim: &mut Simulator, mint: Mint) -> Result<MessageId, SimError> {
        let method = Method::Mint {
            amount: mint.amount,
            recipient: mint.recipient,
            deploy_wallet_value: mint.deploy_wallet_value,
            remaining_gas_to: mint.remaining_gas_to.unwrap_or(self.owner.address),
            notify: mint.notify,
            payload: mint.payload,
        };
        self.call(sim, method, mint.opts)
    }

    pub fn burn_tokens(&self, sim: &mut Simulator, burn: BurnTokens) -> Result<MessageId, SimError> {
        let method = Method::BurnTokens {
            amount: burn.amount,
            wallet_owner: burn.wallet_owner,
            remaining_gas_to: burn.remaining_gas_to.unwrap_or(self.owner.address),
            callback_to: burn.callback_to,
            payload: burn.payload,
        };
        self.call(sim, method, burn.opts)
    }

    pub fn set_burn_paused(&self, sim: &mut Simulator, paused: bool, opts: CallOpts) -> Result<MessageId, SimError> {
        self.call(sim, Method::SetBurnPaused { paused }, opts)
    }

    pub fn disable_mint(&self, sim: &mut Simulator, opts: CallOpts) -> Result<MessageId, SimError> {
        self.call(sim, Method::DisableMint, opts)
    }

    pub fn disable_burn_by_root(&self, sim: &mut Simulator, opts: CallOpts) -> Result<MessageId, SimError> {
        self.call(sim, Method::DisableBurnByRoot, opts)
    }

    pub fn send_surplus_gas(&self, sim: &mut Simulator, to: &Address, opts: CallOpts) -> Result<MessageId, SimError> {
        self.call(sim, Method::SendSurplusGas { to: *to }, opts)
    }

    pub fn transfer_ownership(
        &self,
        sim: &mut Simulator,
        new_owner: &Address,
        remaining_gas_to: &Address,
        callbacks: Vec<Callback>,
        value: u128,
        opts: CallOpts,
    ) -> Result<MessageId, SimError> {
        let method = Method::TransferOwnership {
            new_owner: *new_owner,
            remaining_gas_to: *remaining_gas_to,
            callbacks,
        };
        self.owner.send_call(sim, &self.address, method, value, opts)
    }

    /// Replaces the root code with the artifact `code_name`.
    pub fn upgrade(&self, sim: &mut Simulator, code_name: &str, opts: CallOpts) -> Result<MessageId, SimError> {
        let code = sim.load_code(code_name)?;
        self.call(sim, Method::Upgrade { code }, opts)
    }

    pub fn set_wallet_code(&self, sim: &mut Simulator, code_name: &str, opts: CallOpts) -> Result<MessageId, SimError> {
        let code = sim.load_code(code_name)?;
        self.call(sim, Method::SetWalletCode { code }, opts)
    }
}

// ─────────────────────────────────────────────────────────────
// Wallet
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wallet {
    pub address: Address,
    pub owner: Account,
    pub root: Address,
}

impl Wallet {
    pub fn get(&self, sim: &Simulator, getter: Getter) -> Result<crate::Value, SimError> {
        sim.get(&self.address, getter)
    }

    pub fn token_balance(&self, sim: &Simulator) -> Result<u128, SimError> {
        self.get(sim, Getter::Balance)?.expect_u128()
    }

    /// Native balance; `None` once the wallet is destroyed.
    pub fn balance(&self, sim: &Simulator) -> Option<u128> {
        sim.balance(&self.address)
    }

    pub fn version(&self, sim: &Simulator) -> Result<u32, SimError> {
        self.get(sim, Getter::Version)?.expect_u32()
    }

    pub fn call(&self, sim: &mut Simulator, method: Method, opts: CallOpts) -> Result<MessageId, SimError> {
        let value = sim.config().call_value;
        self.owner.send_call(sim, &self.address, method, value, opts)
    }

    pub fn transfer(&self, sim: &mut Simulator, transfer: Transfer) -> Result<MessageId, SimError> {
        let method = Method::Transfer {
            amount: transfer.amount,
            recipient: transfer.recipient,
            deploy_wallet_value: transfer.deploy_wallet_value,
            remaining_gas_to: transfer.remaining_gas_to.unwrap_or(self.owner.address),
            notify: transfer.notify,
            payload: transfer.payload,
        };
        self.call(sim, method, transfer.opts)
    }

    pub fn transfer_to_wallet(
        &self,
        sim: &mut Simulator,
        amount: u128,
        recipient_wallet: &Address,
        remaining_gas_to: &Address,
        opts: CallOpts,
    ) -> Result<MessageId, SimError> {
        let method = Method::TransferToWallet {
            amount,
            recipient_wallet: *recipient_wallet,
            remaining_gas_to: *remaining_gas_to,
            notify: false,
            payload: Payload::empty(),
        };
        self.call(sim, method, opts)
    }

    pub fn burn(&self, sim: &mut Simulator, burn: Burn) -> Result<MessageId, SimError> {
        let method = Method::Burn {
            amount: burn.amount,
            remaining_gas_to: burn.remaining_gas_to.unwrap_or(self.owner.address),
            callback_to: burn.callback_to,
            payload: burn.payload,
        };
        self.call(sim, method, burn.opts)
    }

    pub fn destroy(&self, sim: &mut Simulator, remaining_gas_to: &Address, opts: CallOpts) -> Result<MessageId, SimError> {
        self.call(
            sim,
            Method::Destroy {
                remaining_gas_to: *remaining_gas_to,
            },
            opts,
        )
    }

    /// Asks the root for the current wallet code; the rest comes back to the owner.
    pub fn upgrade(&self, sim: &mut Simulator, opts: CallOpts) -> Result<MessageId, SimError> {
        self.call(
            sim,
            Method::UpgradeWallet {
                remaining_gas_to: self.owner.address,
            },
            opts,
        )
    }

    /// Token balance, plus the default native balances of the wallet and its owner.
    pub fn check_state(&self, sim: &Simulator, token_balance: u128) -> Result<(), SimError> {
        let native = sim.config().target_wallet_balance;
        let owner_native = sim.config().expected_wallet_owner_balance();
        self.check_state_with(sim, token_balance, native, owner_native)
    }

    pub fn check_state_with(
        &self,
        sim: &Simulator,
        token_balance: u128,
        native: u128,
        owner_native: u128,
    ) -> Result<(), SimError> {
        let tokens = self.token_balance(sim)?;
        if tokens != token_balance {
            return Err(SimError::Assertion(format!(
                "wrong token balance {} (expected {})",
                tokens, token_balance
            )));
        }
        let balance = self.balance(sim);
        if balance != Some(native) {
            return Err(SimError::Assertion(format!(
                "wrong wallet balance {:?} (expected {})",
                balance, native
            )));
        }
        let owner_balance = self.owner.balance(sim);
        if owner_balance != Some(owner_native) {
            return Err(SimError::Assertion(format!(
                "wrong owner balance {:?} (expected {})",
                owner_balance, owner_native
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// Deployer
// ─────────────────────────────────────────────────────────────

/// Token root deployment options. Name, symbol and decimals default to the
/// simulator config.
#[derive(Debug, Clone)]
pub struct RootOptions {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub initial_supply_to: Address,
    pub initial_supply: u128,
    pub mint_disabled: bool,
    pub burn_by_root_disabled: bool,
    pub burn_paused: bool,
    pub remaining_gas_to: Address,
    pub upgradeable: bool,
}

impl Default for RootOptions {
    fn default() -> Self {
        RootOptions {
            name: None,
            symbol: None,
            decimals: None,
            initial_supply_to: Address::ZERO,
            initial_supply: 0,
            mint_disabled: true,
            burn_by_root_disabled: true,
            burn_paused: false,
            remaining_gas_to: Address::ZERO,
            upgradeable: false,
        }
    }
}

pub trait Deployer {
    /// Plain account funded with the default balance.
    fn create_account(&mut self) -> Result<Account, SimError>;

    fn create_account_of(&mut self, code_name: &str, args: ConstructorArgs) -> Result<Account, SimError>;

    fn create_callback_account(&mut self, root: &Address) -> Result<Account, SimError> {
        self.create_account_of(code::WALLET_CALLBACK, ConstructorArgs::WalletCallback { root: *root })
    }

    fn create_root_callback_account(&mut self) -> Result<Account, SimError> {
        self.create_account_of(code::ROOT_TRANSFER_CALLBACK, ConstructorArgs::RootTransferCallback)
    }

    /// Deploys a root owned by `owner` and drains the queue.
    fn create_token_root(&mut self, owner: &Account, options: RootOptions) -> Result<Root, SimError>;

    /// Creates a callback account and has the root deploy its wallet.
    fn create_token_wallet(&mut self, root: &Root) -> Result<Wallet, SimError>;
}

impl Deployer for Simulator {
    fn create_account(&mut self) -> Result<Account, SimError> {
        self.create_account_of(code::ACCOUNT, ConstructorArgs::None)
    }

    fn create_account_of(&mut self, code_name: &str, args: ConstructorArgs) -> Result<Account, SimError> {
        let value = self.config().default_balance;
        let address = self.deploy(code_name, args, value)?;
        Ok(Account { address })
    }

    fn create_token_root(&mut self, owner: &Account, options: RootOptions) -> Result<Root, SimError> {
        let config = self.config().clone();
        let params = RootParams {
            name: options.name.unwrap_or(config.token_name),
            symbol: options.symbol.unwrap_or(config.token_symbol),
            decimals: options.decimals.unwrap_or(config.token_decimals),
            owner: owner.address,
            initial_supply_to: options.initial_supply_to,
            initial_supply: options.initial_supply,
            deploy_wallet_value: config.deploy_wallet_value,
            mint_disabled: options.mint_disabled,
            burn_by_root_disabled: options.burn_by_root_disabled,
            burn_paused: options.burn_paused,
            remaining_gas_to: options.remaining_gas_to,
        };
        let code_name = if options.upgradeable {
            code::TOKEN_ROOT_UPGRADEABLE
        } else {
            code::TOKEN_ROOT
        };
        let address = self.deploy(code_name, ConstructorArgs::TokenRoot(params), config.root_deploy_value)?;
        self.dispatch_all()?;
        info!("token root {} owned by {}", address, owner.address);
        Ok(Root {
            address,
            owner: *owner,
        })
    }

    fn create_token_wallet(&mut self, root: &Root) -> Result<Wallet, SimError> {
        let account = self.create_callback_account(&root.address)?;
        let deploy_wallet_value = self.config().deploy_wallet_value;
        let method = Method::DeployWallet {
            wallet_owner: account.address,
            deploy_wallet_value,
        };
        account.send_call(
            self,
            &root.address,
            method,
            deploy_wallet_value.saturating_add(GRAM / 2),
            CallOpts::default(),
        )?;
        root.wallet_of(self, &account)
    }
}

//! JSON scenarios: a named cast of accounts and roots plus an ordered list of
//! harness steps and assertions, run against a fresh simulator.
//!
//! ```json
//! {
//!   "name": "mint and burn",
//!   "accounts": [{ "name": "owner" }],
//!   "roots": [{ "name": "tst", "owner": "owner", "mint_disabled": false }],
//!   "steps": [
//!     { "action": "deploy_wallet", "root": "tst", "name": "alice" },
//!     { "action": "mint", "root": "tst", "to": "alice", "amount": 100 },
//!     { "action": "burn", "root": "tst", "from": "alice", "amount": "10" },
//!     { "action": "expect_total_supply", "root": "tst", "amount": 90 }
//!   ]
//! }
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::{u128_str, SimConfig};
use crate::error::{ExitCode, SimError, SUCCESS};
use crate::harness::{
    Account, Burn, BurnTokens, CallOpts, Deployer, Mint, Root, RootOptions, Transfer, Wallet,
};
use crate::invariants;
use crate::message::Payload;
use crate::Simulator;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    #[default]
    Plain,
    RootCallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEntry {
    pub name: String,
    #[serde(default)]
    pub kind: AccountKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootEntry {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub mint_disabled: bool,
    #[serde(default)]
    pub burn_by_root_disabled: bool,
    #[serde(default)]
    pub burn_paused: bool,
    #[serde(default)]
    pub upgradeable: bool,
    /// Account that receives the initial supply.
    #[serde(default)]
    pub initial_supply_to: Option<String>,
    #[serde(default, with = "u128_str")]
    pub initial_supply: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    DeployWallet {
        root: String,
        name: String,
    },
    Mint {
        root: String,
        to: String,
        #[serde(with = "u128_str")]
        amount: u128,
        #[serde(default, with = "u128_str")]
        deploy_wallet_value: u128,
        #[serde(default)]
        notify: bool,
        #[serde(default)]
        expect_exit_code: Option<ExitCode>,
        #[serde(default = "default_true")]
        dispatch: bool,
    },
    Transfer {
        root: String,
        from: String,
        to: String,
        #[serde(with = "u128_str")]
        amount: u128,
        #[serde(default, with = "u128_str")]
        deploy_wallet_value: u128,
        #[serde(default)]
        notify: bool,
        #[serde(default)]
        expect_exit_code: Option<ExitCode>,
        #[serde(default = "default_true")]
        dispatch: bool,
    },
    Burn {
        root: String,
        from: String,
        #[serde(with = "u128_str")]
        amount: u128,
        #[serde(default)]
        expect_exit_code: Option<ExitCode>,
        #[serde(default = "default_true")]
        dispatch: bool,
    },
    BurnTokens {
        root: String,
        owner: String,
        #[serde(with = "u128_str")]
        amount: u128,
        #[serde(default)]
        expect_exit_code: Option<ExitCode>,
        #[serde(default = "default_true")]
        dispatch: bool,
    },
    SetBurnPaused {
        root: String,
        paused: bool,
        #[serde(default)]
        expect_exit_code: Option<ExitCode>,
        #[serde(default = "default_true")]
        dispatch: bool,
    },
    DisableMint {
        root: String,
        #[serde(default)]
        expect_exit_code: Option<ExitCode>,
        #[serde(default = "default_true")]
        dispatch: bool,
    },
    TransferOwnership {
        root: String,
        new_owner: String,
        #[serde(default)]
        expect_exit_code: Option<ExitCode>,
        #[serde(default = "default_true")]
        dispatch: bool,
    },
    DispatchAll,
    ExpectTokenBalance {
        root: String,
        owner: String,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    ExpectTotalSupply {
        root: String,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    ExpectOwner {
        root: String,
        owner: String,
    },
    /// Supply of `root`, or of every root plus native value conservation.
    ExpectSupplyInvariant {
        #[serde(default)]
        root: Option<String>,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::DeployWallet { .. } => "deploy_wallet",
            Step::Mint { .. } => "mint",
            Step::Transfer { .. } => "transfer",
            Step::Burn { .. } => "burn",
            Step::BurnTokens { .. } => "burn_tokens",
            Step::SetBurnPaused { .. } => "set_burn_paused",
            Step::DisableMint { .. } => "disable_mint",
            Step::TransferOwnership { .. } => "transfer_ownership",
            Step::DispatchAll => "dispatch_all",
            Step::ExpectTokenBalance { .. } => "expect_token_balance",
            Step::ExpectTotalSupply { .. } => "expect_total_supply",
            Step::ExpectOwner { .. } => "expect_owner",
            Step::ExpectSupplyInvariant { .. } => "expect_supply_invariant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Replaces the runner's config for this scenario.
    #[serde(default)]
    pub config: Option<SimConfig>,
    #[serde(default)]
    pub accounts: Vec<AccountEntry>,
    #[serde(default)]
    pub roots: Vec<RootEntry>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json_str(content: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SimError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub steps: Vec<StepReport>,
    pub passed: bool,
}

fn opts(expect_exit_code: Option<ExitCode>, dispatch: bool) -> CallOpts {
    CallOpts {
        expect_ec: expect_exit_code.unwrap_or(SUCCESS),
        dispatch,
    }
}

/// Named actors of a running scenario.
#[derive(Default)]
struct Cast {
    accounts: BTreeMap<String, Account>,
    roots: BTreeMap<String, Root>,
    wallets: BTreeMap<(String, String), Wallet>,
}

impl Cast {
    fn account(&self, name: &str) -> Result<Account, SimError> {
        self.accounts
            .get(name)
            .copied()
            .ok_or_else(|| SimError::Scenario(format!("unknown account `{}`", name)))
    }

    /// Root handle acting as the owner the root currently has.
    fn root(&self, sim: &Simulator, name: &str) -> Result<Root, SimError> {
        let mut root = self
            .roots
            .get(name)
            .copied()
            .ok_or_else(|| SimError::Scenario(format!("unknown root `{}`", name)))?;
        root.owner = Account {
            address: root.owner_address(sim)?,
        };
        Ok(root)
    }

    /// Wallet of `owner` under `root`, resolved through the root when the
    /// scenario did not create it explicitly.
    fn wallet(&self, sim: &Simulator, root: &str, owner: &str) -> Result<Wallet, SimError> {
        if let Some(wallet) = self.wallets.get(&(root.to_string(), owner.to_string())) {
            return Ok(*wallet);
        }
        let root = self.root(sim, root)?;
        root.wallet_of(sim, &self.account(owner)?)
    }
}

pub struct ScenarioRunner {
    config: SimConfig,
}

impl ScenarioRunner {
    pub fn new(config: SimConfig) -> Self {
        ScenarioRunner { config }
    }

    pub fn run(&self, scenario: &Scenario) -> Result<ScenarioReport, SimError> {
        self.execute(scenario).map(|(report, _)| report)
    }

    /// Runs the scenario and hands back the simulator for inspection. Setup
    /// errors and references to unknown names are returned as `Err`; a step
    /// that fails ends the run with a failed report.
    pub fn execute(&self, scenario: &Scenario) -> Result<(ScenarioReport, Simulator), SimError> {
        let config = scenario.config.clone().unwrap_or_else(|| self.config.clone());
        config.validate()?;
        let mut sim = Simulator::new(config);
        let mut cast = Cast::default();

        for entry in &scenario.accounts {
            let account = match entry.kind {
                AccountKind::Plain => sim.create_account()?,
                AccountKind::RootCallback => sim.create_root_callback_account()?,
            };
            if cast.accounts.insert(entry.name.clone(), account).is_some() {
                return Err(SimError::Scenario(format!("duplicate account `{}`", entry.name)));
            }
        }
        for entry in &scenario.roots {
            let owner = cast.account(&entry.owner)?;
            let initial_supply_to = match &entry.initial_supply_to {
                Some(name) => cast.account(name)?.address,
                None => crate::Address::ZERO,
            };
            let options = RootOptions {
                initial_supply_to,
                initial_supply: entry.initial_supply,
                mint_disabled: entry.mint_disabled,
                burn_by_root_disabled: entry.burn_by_root_disabled,
                burn_paused: entry.burn_paused,
                upgradeable: entry.upgradeable,
                ..RootOptions::default()
            };
            let root = sim.create_token_root(&owner, options)?;
            if sim.contract(&owner.address).is_some_and(|c| c.kind_name() == "root_transfer_callback") {
                owner.set_root(&mut sim, &root.address)?;
            }
            cast.roots.insert(entry.name.clone(), root);
        }

        let mut steps = Vec::with_capacity(scenario.steps.len());
        let mut passed = true;
        for (index, step) in scenario.steps.iter().enumerate() {
            let result = run_step(&mut sim, &mut cast, step);
            let report = match result {
                Ok(()) => StepReport {
                    index,
                    action: step.action(),
                    passed: true,
                    detail: None,
                },
                Err(SimError::Scenario(msg)) => return Err(SimError::Scenario(msg)),
                Err(err) => {
                    warn!("scenario `{}` step {} ({}) failed: {}", scenario.name, index, step.action(), err);
                    StepReport {
                        index,
                        action: step.action(),
                        passed: false,
                        detail: Some(err.to_string()),
                    }
                }
            };
            let failed = !report.passed;
            steps.push(report);
            if failed {
                passed = false;
                break;
            }
        }
        info!(
            "scenario `{}`: {} of {} steps run, {}",
            scenario.name,
            steps.len(),
            scenario.steps.len(),
            if passed { "passed" } else { "failed" }
        );
        Ok((
            ScenarioReport {
                name: scenario.name.clone(),
                steps,
                passed,
            },
            sim,
        ))
    }
}

fn assert_eq_u128(what: &str, actual: u128, expected: u128) -> Result<(), SimError> {
    if actual == expected {
        Ok(())
    } else {
        Err(SimError::Assertion(format!(
            "{}: expected {}, got {}",
            what, expected, actual
        )))
    }
}

fn run_step(sim: &mut Simulator, cast: &mut Cast, step: &Step) -> Result<(), SimError> {
    match step {
        Step::DeployWallet { root, name } => {
            if cast.accounts.contains_key(name) {
                return Err(SimError::Scenario(format!("duplicate account `{}`", name)));
            }
            let handle = cast.root(sim, root)?;
            let wallet = sim.create_token_wallet(&handle)?;
            cast.accounts.insert(name.clone(), wallet.owner);
            cast.wallets.insert((root.clone(), name.clone()), wallet);
            Ok(())
        }
        Step::Mint {
            root,
            to,
            amount,
            deploy_wallet_value,
            notify,
            expect_exit_code,
            dispatch,
        } => {
            let handle = cast.root(sim, root)?;
            let mut mint = Mint::new(*amount, cast.account(to)?.address).deploy_wallet_value(*deploy_wallet_value);
            if *notify {
                mint = mint.notify(Payload::empty());
            }
            mint.opts = opts(*expect_exit_code, *dispatch);
            handle.mint(sim, mint)?;
            Ok(())
        }
        Step::Transfer {
            root,
            from,
            to,
            amount,
            deploy_wallet_value,
            notify,
            expect_exit_code,
            dispatch,
        } => {
            let wallet = cast.wallet(sim, root, from)?;
            let mut transfer =
                Transfer::new(*amount, cast.account(to)?.address).deploy_wallet_value(*deploy_wallet_value);
            if *notify {
                transfer = transfer.notify(Payload::empty());
            }
            transfer.opts = opts(*expect_exit_code, *dispatch);
            wallet.transfer(sim, transfer)?;
            Ok(())
        }
        Step::Burn {
            root,
            from,
            amount,
            expect_exit_code,
            dispatch,
        } => {
            let wallet = cast.wallet(sim, root, from)?;
            let mut burn = Burn::new(*amount);
            burn.opts = opts(*expect_exit_code, *dispatch);
            wallet.burn(sim, burn)?;
            Ok(())
        }
        Step::BurnTokens {
            root,
            owner,
            amount,
            expect_exit_code,
            dispatch,
        } => {
            let handle = cast.root(sim, root)?;
            let mut burn = BurnTokens::new(*amount, cast.account(owner)?.address);
            burn.opts = opts(*expect_exit_code, *dispatch);
            handle.burn_tokens(sim, burn)?;
            Ok(())
        }
        Step::SetBurnPaused {
            root,
            paused,
            expect_exit_code,
            dispatch,
        } => {
            cast.root(sim, root)?
                .set_burn_paused(sim, *paused, opts(*expect_exit_code, *dispatch))?;
            Ok(())
        }
        Step::DisableMint {
            root,
            expect_exit_code,
            dispatch,
        } => {
            cast.root(sim, root)?
                .disable_mint(sim, opts(*expect_exit_code, *dispatch))?;
            Ok(())
        }
        Step::TransferOwnership {
            root,
            new_owner,
            expect_exit_code,
            dispatch,
        } => {
            let handle = cast.root(sim, root)?;
            let new_owner = cast.account(new_owner)?;
            let value = sim.config().call_value;
            handle.transfer_ownership(
                sim,
                &new_owner.address,
                &handle.owner.address,
                Vec::new(),
                value,
                opts(*expect_exit_code, *dispatch),
            )?;
            Ok(())
        }
        Step::DispatchAll => {
            sim.dispatch_all()?;
            Ok(())
        }
        Step::ExpectTokenBalance {
            root,
            owner,
            amount,
        } => {
            let wallet = cast.wallet(sim, root, owner)?;
            assert_eq_u128(
                &format!("token balance of `{}`", owner),
                wallet.token_balance(sim)?,
                *amount,
            )
        }
        Step::ExpectTotalSupply { root, amount } => assert_eq_u128(
            &format!("total supply of `{}`", root),
            cast.root(sim, root)?.total_supply(sim)?,
            *amount,
        ),
        Step::ExpectOwner { root, owner } => {
            let actual = cast.root(sim, root)?.owner_address(sim)?;
            let expected = cast.account(owner)?.address;
            if actual == expected {
                Ok(())
            } else {
                Err(SimError::Assertion(format!(
                    "owner of `{}`: expected `{}` ({}), got {}",
                    root, owner, expected, actual
                )))
            }
        }
        Step::ExpectSupplyInvariant { root } => match root {
            Some(name) => invariants::check_supply(sim, &cast.root(sim, name)?.address),
            None => invariants::check_all(sim),
        },
    }
}

const DEMO: &str = include_str!("../scenarios/demo.json");

/// Built-in walkthrough: mint, transfer, burn and a bounced burn while paused.
pub fn demo() -> Result<Scenario, SimError> {
    Scenario::from_json_str(DEMO)
}

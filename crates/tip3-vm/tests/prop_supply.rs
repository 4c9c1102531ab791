// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PROPERTY-BASED TESTS — tip3-vm
//
// Random sequences of root and wallet operations, some of them failing or
// bouncing, must leave token supply and native value balanced.
//
// Run: cargo test --release -p tip3-vm --test prop_supply
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use proptest::prelude::*;
use tip3_vm::harness::{Burn, BurnTokens, CallOpts, Deployer, Mint, Root, RootOptions, Transfer, Wallet};
use tip3_vm::invariants::{check_all, check_value_conservation, wallet_supply};
use tip3_vm::{Address, SimConfig, Simulator};

const HOLDERS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Mint { to: usize, amount: u128 },
    Transfer { from: usize, to: usize, amount: u128 },
    TransferToStranger { from: usize, amount: u128, deploy: bool },
    Burn { from: usize, amount: u128 },
    BurnTokens { owner: usize, amount: u128 },
    Pause(bool),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let holder = 0..HOLDERS;
    prop_oneof![
        (holder.clone(), 0u128..1_000_000).prop_map(|(to, amount)| Op::Mint { to, amount }),
        (holder.clone(), holder.clone(), 0u128..2_000_000)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (holder.clone(), 0u128..2_000_000, any::<bool>())
            .prop_map(|(from, amount, deploy)| Op::TransferToStranger { from, amount, deploy }),
        (holder.clone(), 0u128..2_000_000).prop_map(|(from, amount)| Op::Burn { from, amount }),
        (holder, 0u128..2_000_000).prop_map(|(owner, amount)| Op::BurnTokens { owner, amount }),
        any::<bool>().prop_map(Op::Pause),
    ]
}

fn setup() -> (Simulator, Root, Vec<Wallet>) {
    let mut sim = Simulator::new(SimConfig::default());
    let owner = sim.create_account().unwrap();
    let options = RootOptions {
        mint_disabled: false,
        burn_by_root_disabled: false,
        ..RootOptions::default()
    };
    let root = sim.create_token_root(&owner, options).unwrap();
    let wallets = (0..HOLDERS)
        .map(|_| sim.create_token_wallet(&root).unwrap())
        .collect();
    (sim, root, wallets)
}

/// Queues `op` without asserting on its outcome, then drains the queue.
fn apply(sim: &mut Simulator, root: &Root, wallets: &[Wallet], op: &Op) {
    let deferred = CallOpts::deferred();
    match op {
        Op::Mint { to, amount } => {
            let mut mint = Mint::new(*amount, wallets[*to].owner.address);
            mint.opts = deferred;
            root.mint(sim, mint).unwrap();
        }
        Op::Transfer { from, to, amount } => {
            let transfer = Transfer::new(*amount, wallets[*to].owner.address).deferred();
            wallets[*from].transfer(sim, transfer).unwrap();
        }
        Op::TransferToStranger { from, amount, deploy } => {
            let mut transfer = Transfer::new(*amount, Address::random()).deferred();
            if *deploy {
                transfer = transfer.deploy_wallet_value(sim.config().deploy_wallet_value);
            }
            wallets[*from].transfer(sim, transfer).unwrap();
        }
        Op::Burn { from, amount } => {
            wallets[*from].burn(sim, Burn::new(*amount).deferred()).unwrap();
        }
        Op::BurnTokens { owner, amount } => {
            let burn = BurnTokens::new(*amount, wallets[*owner].owner.address).deferred();
            root.burn_tokens(sim, burn).unwrap();
        }
        Op::Pause(paused) => {
            root.set_burn_paused(sim, *paused, deferred).unwrap();
        }
    }
    sim.dispatch_all().unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// PROPERTY: after every drained operation the wallets hold exactly the
    /// root's total supply and no native value has appeared or vanished
    #[test]
    fn prop_supply_and_value_conserved(ops in prop::collection::vec(arb_op(), 1..20)) {
        let (mut sim, root, wallets) = setup();
        for op in &ops {
            apply(&mut sim, &root, &wallets, op);
            prop_assert!(check_all(&sim).is_ok(), "after {:?}: {:?}", op, check_all(&sim));
        }
    }

    /// PROPERTY: a transfer to a wallet that does not exist bounces back and
    /// restores the sender's balance
    #[test]
    fn prop_bounced_transfer_restores_balance(minted in 1u128..1_000_000, sent in 1u128..1_000_000) {
        let (mut sim, root, wallets) = setup();
        apply(&mut sim, &root, &wallets, &Op::Mint { to: 0, amount: minted });
        let supply_before = wallet_supply(&sim, &root.address).unwrap();

        apply(&mut sim, &root, &wallets, &Op::TransferToStranger { from: 0, amount: sent, deploy: false });

        prop_assert_eq!(wallets[0].token_balance(&sim).unwrap(), minted);
        prop_assert_eq!(wallet_supply(&sim, &root.address).unwrap(), supply_before);
        prop_assert_eq!(root.total_supply(&sim).unwrap(), supply_before);
        prop_assert!(check_value_conservation(&sim).is_ok());
    }

    /// PROPERTY: config amounts parse the same from TOML integers and strings
    #[test]
    fn prop_config_amounts_accept_strings(value in 1u128..u128::MAX) {
        let toml = format!("call_value = \"{}\"", value);
        let config = SimConfig::from_toml_str(&toml).unwrap();
        prop_assert_eq!(config.call_value, value);
    }
}

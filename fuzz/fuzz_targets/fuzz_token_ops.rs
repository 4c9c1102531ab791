//! Fuzz target: random token operations
//!
//! Drives mint/transfer/burn sequences decoded from the input and checks
//! supply and value conservation after every drained step.
//!
//! Run: cargo +nightly fuzz run fuzz_token_ops

#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tip3_vm::harness::{Burn, BurnTokens, CallOpts, Deployer, Mint, RootOptions, Transfer};
use tip3_vm::invariants::check_all;
use tip3_vm::Simulator;

#[derive(Debug, Arbitrary)]
enum Op {
    Mint { to: u8, amount: u64 },
    Transfer { from: u8, to: u8, amount: u64, deploy: bool },
    Burn { from: u8, amount: u64 },
    BurnTokens { owner: u8, amount: u64 },
    Pause(bool),
}

fuzz_target!(|ops: Vec<Op>| {
    let mut sim = Simulator::default();
    let Ok(owner) = sim.create_account() else { return };
    let options = RootOptions {
        mint_disabled: false,
        burn_by_root_disabled: false,
        ..RootOptions::default()
    };
    let Ok(root) = sim.create_token_root(&owner, options) else { return };
    let wallets: Vec<_> = (0..3).filter_map(|_| sim.create_token_wallet(&root).ok()).collect();
    if wallets.len() != 3 {
        return;
    }
    let pick = |i: u8| &wallets[i as usize % wallets.len()];

    for op in ops.iter().take(32) {
        let _ = match op {
            Op::Mint { to, amount } => {
                let mut mint = Mint::new(*amount as u128, pick(*to).owner.address);
                mint.opts = CallOpts::deferred();
                root.mint(&mut sim, mint)
            }
            Op::Transfer { from, to, amount, deploy } => {
                let mut transfer = Transfer::new(*amount as u128, pick(*to).owner.address).deferred();
                if *deploy {
                    transfer = transfer.deploy_wallet_value(sim.config().deploy_wallet_value);
                }
                pick(*from).transfer(&mut sim, transfer)
            }
            Op::Burn { from, amount } => pick(*from).burn(&mut sim, Burn::new(*amount as u128).deferred()),
            Op::BurnTokens { owner, amount } => {
                let burn = BurnTokens::new(*amount as u128, pick(*owner).owner.address).deferred();
                root.burn_tokens(&mut sim, burn)
            }
            Op::Pause(paused) => root.set_burn_paused(&mut sim, *paused, CallOpts::deferred()),
        };
        if sim.dispatch_all().is_err() {
            return;
        }
        assert!(check_all(&sim).is_ok(), "{:?}", check_all(&sim));
    }
});

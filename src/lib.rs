// ============================================================================
// SHARED FIXTURES — token integration tests
//
// Run: cargo test -p tip3-sim-integration-tests
// ============================================================================

use tip3_vm::harness::{Account, Deployer, Mint, Root, RootOptions, Wallet};
use tip3_vm::{Payload, SimConfig, Simulator, GRAM};

pub const DEPLOY_WALLET_VALUE: u128 = GRAM / 10;
pub const TARGET_ROOT_BALANCE: u128 = GRAM;

pub fn test_payload() -> Payload {
    Payload::from("test payload")
}

pub fn test_payload_2() -> Payload {
    Payload::from("another payload")
}

pub fn simulator() -> Simulator {
    let _ = env_logger::builder().is_test(true).try_init();
    Simulator::new(SimConfig::default())
}

pub fn default_balance(sim: &Simulator) -> u128 {
    sim.config().default_balance
}

pub fn expected_owner_balance(sim: &Simulator) -> u128 {
    sim.config().expected_wallet_owner_balance()
}

/// Root with minting enabled, owned by a fresh plain account.
pub fn mintable_root(sim: &mut Simulator) -> Root {
    let owner = sim.create_account().unwrap();
    let options = RootOptions {
        mint_disabled: false,
        ..RootOptions::default()
    };
    sim.create_token_root(&owner, options).unwrap()
}

/// Mintable root plus one wallet holding `amount` tokens.
pub fn funded_wallet(sim: &mut Simulator, options: RootOptions, amount: u128) -> (Root, Wallet) {
    let owner = sim.create_account().unwrap();
    let root = sim.create_token_root(&owner, options).unwrap();
    let wallet = sim.create_token_wallet(&root).unwrap();
    root.mint(sim, Mint::new(amount, wallet.owner.address)).unwrap();
    (root, wallet)
}

pub fn account(sim: &mut Simulator) -> Account {
    sim.create_account().unwrap()
}

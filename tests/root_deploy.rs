// ============================================================================
// ROOT DEPLOY — constructor parameters, getters, initial supply
// ============================================================================

use tip3_sim_integration_tests::*;
use tip3_vm::code;
use tip3_vm::contracts::interface;
use tip3_vm::harness::{Deployer, RootOptions};
use tip3_vm::{Address, Getter, GRAM};

#[test]
fn test_root_deploy_base() {
    let mut sim = simulator();
    let owner = account(&mut sim);
    let root = sim.create_token_root(&owner, RootOptions::default()).unwrap();
    let config = sim.config().clone();
    let expected_code = sim.load_code(code::TOKEN_WALLET).unwrap();

    let text = |getter| root.get(&sim, getter).unwrap().expect_text().unwrap();
    assert_eq!(text(Getter::Name), config.token_name, "Wrong name");
    assert_eq!(text(Getter::Symbol), config.token_symbol, "Wrong symbol");
    assert_eq!(
        root.get(&sim, Getter::Decimals).unwrap().expect_u8().unwrap(),
        config.token_decimals,
        "Wrong decimals"
    );
    assert_eq!(root.owner_address(&sim).unwrap(), owner.address, "Wrong owner");
    assert_eq!(
        root.get(&sim, Getter::WalletCode).unwrap().expect_code().unwrap(),
        expected_code,
        "Wrong wallet code"
    );
    assert_eq!(root.total_supply(&sim).unwrap(), 0, "Wrong total supply");

    let flag = |getter| root.get(&sim, getter).unwrap().expect_bool().unwrap();
    assert!(flag(Getter::MintDisabled), "Wrong `mintDisabled` value");
    assert!(flag(Getter::BurnByRootDisabled), "Wrong `burnByRootDisabled` value");
    assert!(!flag(Getter::BurnPaused), "Wrong `burnPaused` value");
    for &id in interface::ROOT {
        assert!(flag(Getter::SupportsInterface { id }), "Interface {:x} is not supported", id);
    }
    assert_eq!(root.balance(&sim), Some(2 * GRAM), "Wrong root balance");
}

#[test]
fn test_root_deploy_initial_supply() {
    let mut sim = simulator();
    let owner = account(&mut sim);
    let holder = account(&mut sim);
    let options = RootOptions {
        initial_supply_to: holder.address,
        initial_supply: 100,
        ..RootOptions::default()
    };
    let root = sim.create_token_root(&owner, options).unwrap();
    let wallet = root.wallet_of(&sim, &holder).unwrap();
    assert_eq!(root.total_supply(&sim).unwrap(), 100, "Wrong total supply");
    assert_eq!(wallet.token_balance(&sim).unwrap(), 100, "Wrong initial supply balance");
}

#[test]
fn test_root_deploy_initial_supply_zero_address() {
    let mut sim = simulator();
    let owner = account(&mut sim);
    let options = RootOptions {
        initial_supply_to: Address::ZERO,
        initial_supply: 100,
        ..RootOptions::default()
    };
    let root = sim.create_token_root(&owner, options).unwrap();
    assert_eq!(root.total_supply(&sim).unwrap(), 0, "Wrong total supply");
}

#[test]
fn test_root_deploy_custom_metadata() {
    let mut sim = simulator();
    let owner = account(&mut sim);
    let options = RootOptions {
        name: Some("Wrapped Ever".into()),
        symbol: Some("WEVER".into()),
        decimals: Some(18),
        ..RootOptions::default()
    };
    let root = sim.create_token_root(&owner, options).unwrap();
    assert_eq!(
        root.get(&sim, Getter::Symbol).unwrap().expect_text().unwrap(),
        "WEVER"
    );
    assert_eq!(root.get(&sim, Getter::Decimals).unwrap().expect_u8().unwrap(), 18);
}

// ============================================================================
// BURN — owner burns, root burns, pause and disable switches, bounced burns
// ============================================================================

use tip3_sim_integration_tests::*;
use tip3_vm::harness::{Burn, BurnTokens, CallOpts, Root, RootOptions, Wallet};
use tip3_vm::{Getter, Simulator, GRAM};

fn setup() -> (Simulator, Root, Wallet) {
    let mut sim = simulator();
    let options = RootOptions {
        mint_disabled: false,
        burn_by_root_disabled: false,
        ..RootOptions::default()
    };
    let (root, wallet) = funded_wallet(&mut sim, options, 100);
    (sim, root, wallet)
}

fn burn_paused(sim: &Simulator, root: &Root) -> bool {
    root.get(sim, Getter::BurnPaused).unwrap().expect_bool().unwrap()
}

fn assert_burn_callback(sim: &Simulator, root: &Root, wallet: &Wallet) {
    assert_eq!(root.total_supply(sim).unwrap(), 90, "Wrong total supply");
    let callbacks = wallet.owner.callbacks(sim).unwrap();
    assert!(callbacks.burned, "Wrong callback");
    assert_eq!(callbacks.burned_amount, 10, "Wrong callback");
    assert_eq!(callbacks.burned_payload, Some(test_payload()), "Wrong callback");
    assert!(!callbacks.burned_bounced, "Wrong callback");
    assert!(!burn_paused(sim, root), "Wrong `burnPaused` value");
    wallet.check_state(sim, 90).unwrap();
}

fn assert_burn_bounced_callback(sim: &Simulator, root: &Root, wallet: &Wallet) {
    let callbacks = wallet.owner.callbacks(sim).unwrap();
    assert!(callbacks.burned_bounced, "Wrong callback");
    assert_eq!(callbacks.burned_amount, 10, "Wrong callback");
    assert_eq!(root.total_supply(sim).unwrap(), 100, "Wrong total supply");
    assert!(burn_paused(sim, root), "Wrong `burnPaused` value");
}

// ============================================================================
// WALLET BURN
// ============================================================================

#[test]
fn test_burn_wallet() {
    let (mut sim, root, wallet) = setup();
    wallet.burn(&mut sim, Burn::new(10)).unwrap();
    wallet.check_state(&sim, 90).unwrap();
    assert_eq!(root.total_supply(&sim).unwrap(), 90, "Wrong total supply");
}

#[test]
fn test_burn_wallet_zero_amount() {
    let (mut sim, root, wallet) = setup();
    wallet.burn(&mut sim, Burn::new(0).expect(1050)).unwrap();
    wallet.check_state(&sim, 100).unwrap();
    assert_eq!(root.total_supply(&sim).unwrap(), 100, "Wrong total supply");
}

#[test]
fn test_burn_wallet_not_enough_balance() {
    let (mut sim, root, wallet) = setup();
    wallet.burn(&mut sim, Burn::new(1000).expect(1060)).unwrap();
    wallet.check_state(&sim, 100).unwrap();
    assert_eq!(root.total_supply(&sim).unwrap(), 100, "Wrong total supply");
}

#[test]
fn test_burn_wallet_pause() {
    let (mut sim, root, wallet) = setup();
    assert!(!burn_paused(&sim, &root), "Wrong `burnPaused` value");
    root.set_burn_paused(&mut sim, true, CallOpts::default()).unwrap();
    wallet.burn(&mut sim, Burn::new(10).deferred()).unwrap();
    sim.dispatch_with_exception(2200, 1).unwrap();
    assert_burn_bounced_callback(&sim, &root, &wallet);
    wallet.check_state(&sim, 100).unwrap();
}

#[test]
fn test_burn_wallet_callback() {
    let (mut sim, root, wallet) = setup();
    let burn = Burn::new(10).callback(wallet.owner.address, test_payload());
    wallet.burn(&mut sim, burn).unwrap();
    assert_burn_callback(&sim, &root, &wallet);
}

// ============================================================================
// ROOT BURN
// ============================================================================

#[test]
fn test_burn_by_root() {
    let (mut sim, root, wallet) = setup();
    root.burn_tokens(&mut sim, BurnTokens::new(10, wallet.owner.address))
        .unwrap();
    wallet.check_state(&sim, 90).unwrap();
    assert_eq!(root.total_supply(&sim).unwrap(), 90, "Wrong total supply");
}

#[test]
fn test_burn_by_root_zero_amount() {
    let (mut sim, root, wallet) = setup();
    root.burn_tokens(&mut sim, BurnTokens::new(0, wallet.owner.address).expect(1050))
        .unwrap();
    wallet.check_state(&sim, 100).unwrap();
    assert_eq!(root.total_supply(&sim).unwrap(), 100, "Wrong total supply");
}

#[test]
fn test_burn_by_root_not_enough_balance() {
    let (mut sim, root, wallet) = setup();
    root.burn_tokens(&mut sim, BurnTokens::new(1000, wallet.owner.address).deferred())
        .unwrap();
    sim.dispatch_with_exception(1060, 1).unwrap();
    wallet.check_state(&sim, 100).unwrap();
    assert_eq!(root.total_supply(&sim).unwrap(), 100, "Wrong total supply");
}

#[test]
fn test_burn_by_root_disable() {
    let (mut sim, root, wallet) = setup();
    let disabled = |sim: &Simulator| {
        root.get(sim, Getter::BurnByRootDisabled)
            .unwrap()
            .expect_bool()
            .unwrap()
    };
    assert!(!disabled(&sim), "Wrong `burnByRootDisabled` value");
    root.disable_burn_by_root(&mut sim, CallOpts::default()).unwrap();
    assert!(disabled(&sim), "Wrong `burnByRootDisabled` value");

    root.burn_tokens(&mut sim, BurnTokens::new(10, wallet.owner.address).expect(2210))
        .unwrap();
    assert_eq!(root.total_supply(&sim).unwrap(), 100, "Wrong total supply");
    wallet.check_state(&sim, 100).unwrap();
}

#[test]
fn test_burn_by_root_callback() {
    let (mut sim, root, wallet) = setup();
    let burn = BurnTokens::new(10, wallet.owner.address).callback(wallet.owner.address, test_payload());
    root.burn_tokens(&mut sim, burn).unwrap();
    assert_burn_callback(&sim, &root, &wallet);
}

/// burnTokens -> setBurnPaused -> burnByRoot -> acceptBurn (2200) -> onBounceTokensBurn
#[test]
fn test_burn_by_root_and_pause() {
    let (mut sim, root, wallet) = setup();
    root.burn_tokens(&mut sim, BurnTokens::new(10, wallet.owner.address).deferred())
        .unwrap();
    root.set_burn_paused(&mut sim, true, CallOpts::deferred()).unwrap();
    sim.dispatch_with_exception(2200, 4).unwrap();
    assert_burn_bounced_callback(&sim, &root, &wallet);
    let target = sim.config().target_wallet_balance;
    wallet
        .check_state_with(&sim, 100, target, expected_owner_balance(&sim) + GRAM)
        .unwrap();
}

// ============================================================================
// UPGRADEABLE — root code upgrade, wallet code rollout, mixed versions
// ============================================================================

use tip3_sim_integration_tests::*;
use tip3_vm::code;
use tip3_vm::harness::{CallOpts, Deployer, Mint, Root, RootOptions, Transfer, Wallet};
use tip3_vm::{Getter, Method, Simulator, GRAM};

fn setup() -> (Simulator, Root) {
    let mut sim = simulator();
    let owner = account(&mut sim);
    let options = RootOptions {
        mint_disabled: false,
        upgradeable: true,
        ..RootOptions::default()
    };
    let root = sim.create_token_root(&owner, options).unwrap();
    (sim, root)
}

fn wallet_version(sim: &Simulator, root: &Root) -> u32 {
    root.get(sim, Getter::WalletVersion).unwrap().expect_u32().unwrap()
}

fn only_in_v2(sim: &Simulator, address: &tip3_vm::Address) -> String {
    sim.get(address, Getter::OnlyInV2).unwrap().expect_text().unwrap()
}

fn roll_out_v2(sim: &mut Simulator, root: &Root) {
    root.set_wallet_code(sim, code::TOKEN_WALLET_UPGRADEABLE_V2, CallOpts::default())
        .unwrap();
}

fn upgrade(sim: &mut Simulator, wallet: &Wallet) {
    wallet.upgrade(sim, CallOpts::default()).unwrap();
}

#[test]
fn test_root_upgrade() {
    let (mut sim, root) = setup();
    assert!(sim.get(&root.address, Getter::OnlyInV2).is_err());
    root.upgrade(&mut sim, code::TOKEN_ROOT_UPGRADEABLE_V2, CallOpts::default())
        .unwrap();
    assert_eq!(only_in_v2(&sim, &root.address), "Some method in root v2", "Wrong updating");
}

#[test]
fn test_wallet_upgrade() {
    let (mut sim, root) = setup();
    let wallet = sim.create_token_wallet(&root).unwrap();
    assert_eq!(wallet_version(&sim, &root), 1, "Wrong version");
    assert_eq!(wallet.version(&sim).unwrap(), 1, "Wrong version");

    roll_out_v2(&mut sim, &root);
    assert_eq!(wallet_version(&sim, &root), 2, "Wrong version");
    upgrade(&mut sim, &wallet);
    assert_eq!(wallet.version(&sim).unwrap(), 2, "Wrong version");
    assert_eq!(
        only_in_v2(&sim, &wallet.address),
        "Some method in wallet v2",
        "Wrong updating"
    );
}

#[test]
fn test_wallet_no_upgrade() {
    let (mut sim, root) = setup();
    let wallet = sim.create_token_wallet(&root).unwrap();
    upgrade(&mut sim, &wallet);
    assert_eq!(wallet_version(&sim, &root), 1, "Wrong version");
    assert_eq!(wallet.version(&sim).unwrap(), 1, "Wrong version");
}

#[test]
fn test_deploy_retry() {
    let (mut sim, root) = setup();
    let wallet_1 = sim.create_token_wallet(&root).unwrap();
    let wallet_2 = sim.create_token_wallet(&root).unwrap();
    root.mint(&mut sim, Mint::new(100, wallet_1.owner.address)).unwrap();
    wallet_1
        .transfer(
            &mut sim,
            Transfer::new(10, wallet_2.owner.address).deploy_wallet_value(DEPLOY_WALLET_VALUE),
        )
        .unwrap();
    assert_eq!(wallet_1.token_balance(&sim).unwrap(), 90);
    assert_eq!(wallet_2.token_balance(&sim).unwrap(), 10);
}

#[test]
fn test_different_versions() {
    let (mut sim, root) = setup();
    let wallet_1 = sim.create_token_wallet(&root).unwrap();
    let wallet_2 = sim.create_token_wallet(&root).unwrap();
    roll_out_v2(&mut sim, &root);
    upgrade(&mut sim, &wallet_1);
    assert_eq!(
        wallet_1.version(&sim).unwrap(),
        wallet_2.version(&sim).unwrap() + 1,
        "Wrong version"
    );

    root.mint(&mut sim, Mint::new(100, wallet_1.owner.address)).unwrap();
    wallet_1
        .transfer(&mut sim, Transfer::new(10, wallet_2.owner.address))
        .unwrap();
    wallet_1.check_state(&sim, 90).unwrap();
    wallet_2.check_state(&sim, 10).unwrap();
}

#[test]
fn test_upgrades_not_owner() {
    let (mut sim, root) = setup();
    let stranger = account(&mut sim);
    let new_code = sim.load_code(code::ACCOUNT).unwrap();

    let upgrade_root = Method::Upgrade { code: new_code.clone() };
    stranger
        .send_call(&mut sim, &root.address, upgrade_root, GRAM, CallOpts::expect(1000))
        .unwrap();

    let wallet = sim.create_token_wallet(&root).unwrap();
    let upgrade_wallet = Method::UpgradeWallet {
        remaining_gas_to: stranger.address,
    };
    stranger
        .send_call(&mut sim, &wallet.address, upgrade_wallet, GRAM, CallOpts::expect(1000))
        .unwrap();

    let set_code = Method::SetWalletCode { code: new_code };
    stranger
        .send_call(&mut sim, &root.address, set_code, GRAM, CallOpts::expect(1000))
        .unwrap();
}

#[test]
fn test_upgrade_with_incompatible_code() {
    let (mut sim, root) = setup();
    root.upgrade(&mut sim, code::ACCOUNT, CallOpts::expect(2300)).unwrap();
    root.set_wallet_code(&mut sim, code::TOKEN_WALLET, CallOpts::expect(2300))
        .unwrap();
    assert_eq!(wallet_version(&sim, &root), 1);
}

//! Conservation checks, meant to run between dispatch cycles.

use crate::address::Address;
use crate::error::SimError;
use crate::Simulator;

/// Sum of the token balances of every wallet that names `root` as its root.
pub fn wallet_supply(sim: &Simulator, root: &Address) -> Result<u128, SimError> {
    sim.registry()
        .wallets_of(root)
        .try_fold(0u128, |sum, (_, wallet)| sum.checked_add(wallet.balance))
        .ok_or_else(|| SimError::InvariantViolated(format!("wallet supply of {} overflows", root)))
}

/// `Σ wallet balances == totalSupply` for `root`. Only meaningful once the
/// queue has drained: in-flight mints and burns are counted on one side only.
pub fn check_supply(sim: &Simulator, root: &Address) -> Result<(), SimError> {
    if !sim.pending().is_empty() {
        return Err(SimError::InvariantViolated(format!(
            "supply of {} checked with {} messages in flight",
            root,
            sim.pending().len()
        )));
    }
    let total_supply = sim
        .contract(root)
        .and_then(|c| c.as_root())
        .map(|r| r.total_supply)
        .ok_or(SimError::NoContract(*root))?;
    let held = wallet_supply(sim, root)?;
    if held != total_supply {
        return Err(SimError::InvariantViolated(format!(
            "root {} reports supply {} but its wallets hold {}",
            root, total_supply, held
        )));
    }
    Ok(())
}

/// Native value is never created or destroyed by delivery:
/// `Σ balances + Σ queued value + burned == minted`.
pub fn check_value_conservation(sim: &Simulator) -> Result<(), SimError> {
    let overflow = || SimError::InvariantViolated("native value overflows".into());
    let held = sim.registry().total_balance().ok_or_else(overflow)?;
    let in_flight = sim
        .pending()
        .iter()
        .try_fold(0u128, |sum, m| sum.checked_add(m.value))
        .ok_or_else(overflow)?;
    let accounted = held
        .checked_add(in_flight)
        .and_then(|v| v.checked_add(sim.burned()))
        .ok_or_else(overflow)?;
    if accounted != sim.minted() {
        return Err(SimError::InvariantViolated(format!(
            "held {} + in flight {} + burned {} != minted {}",
            held,
            in_flight,
            sim.burned(),
            sim.minted()
        )));
    }
    Ok(())
}

/// Value conservation plus the supply check for every deployed root.
pub fn check_all(sim: &Simulator) -> Result<(), SimError> {
    check_value_conservation(sim)?;
    let roots: Vec<Address> = sim
        .registry()
        .iter()
        .filter(|a| a.contract.as_ref().and_then(|c| c.as_root()).is_some())
        .map(|a| a.address)
        .collect();
    for root in &roots {
        check_supply(sim, root)?;
    }
    Ok(())
}

use std::collections::BTreeMap;

use crate::address::Address;
use crate::code::Code;
use crate::contracts::{Contract, TokenWallet};
use crate::error::SimError;

/// An addressable account.
///
/// An actor without code is uninit: it only holds value that arrived with a
/// non-bounceable message before anything was deployed there.
#[derive(Debug, Clone)]
pub struct Actor {
    pub address: Address,
    pub balance: u128,
    pub code: Option<Code>,
    pub contract: Option<Contract>,
}

impl Actor {
    pub fn active(address: Address, balance: u128, code: Code, contract: Contract) -> Self {
        Actor {
            address,
            balance,
            code: Some(code),
            contract: Some(contract),
        }
    }

    pub fn uninit(address: Address, balance: u128) -> Self {
        Actor {
            address,
            balance,
            code: None,
            contract: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.contract.is_some()
    }
}

/// All actors, keyed by address. BTreeMap keeps iteration deterministic.
#[derive(Debug, Default, Clone)]
pub struct ActorRegistry {
    actors: BTreeMap<Address, Actor>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh active actor. Value already parked on an uninit actor at
    /// the same address is merged into the new balance.
    pub fn insert(&mut self, mut actor: Actor) -> Result<(), SimError> {
        if let Some(existing) = self.actors.get(&actor.address) {
            if existing.is_active() {
                return Err(SimError::AddressCollision(actor.address));
            }
            actor.balance = actor
                .balance
                .checked_add(existing.balance)
                .ok_or_else(|| SimError::InvariantViolated("balance overflow".into()))?;
        }
        self.actors.insert(actor.address, actor);
        Ok(())
    }

    /// Replaces whatever is stored at the actor's address.
    pub(crate) fn put(&mut self, actor: Actor) {
        self.actors.insert(actor.address, actor);
    }

    pub fn get(&self, address: &Address) -> Option<&Actor> {
        self.actors.get(address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut Actor> {
        self.actors.get_mut(address)
    }

    pub fn remove(&mut self, address: &Address) -> Option<Actor> {
        self.actors.remove(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.actors.contains_key(address)
    }

    pub fn is_active(&self, address: &Address) -> bool {
        self.actors.get(address).is_some_and(Actor::is_active)
    }

    pub fn balance(&self, address: &Address) -> Option<u128> {
        self.actors.get(address).map(|a| a.balance)
    }

    /// Adds value to an address, creating an uninit actor if nothing is there.
    pub(crate) fn credit(&mut self, address: Address, value: u128) -> Result<(), SimError> {
        let actor = self
            .actors
            .entry(address)
            .or_insert_with(|| Actor::uninit(address, 0));
        actor.balance = actor
            .balance
            .checked_add(value)
            .ok_or_else(|| SimError::InvariantViolated("balance overflow".into()))?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Wallets whose recorded root is `root`.
    pub fn wallets_of<'a>(
        &'a self,
        root: &'a Address,
    ) -> impl Iterator<Item = (&'a Address, &'a TokenWallet)> + 'a {
        self.actors.iter().filter_map(move |(address, actor)| match &actor.contract {
            Some(Contract::TokenWallet(wallet)) if &wallet.root == root => Some((address, wallet)),
            _ => None,
        })
    }

    /// Native value held by every actor.
    pub fn total_balance(&self) -> Option<u128> {
        self.actors
            .values()
            .try_fold(0u128, |sum, actor| sum.checked_add(actor.balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Code, CodeKind};

    fn account(address: Address, balance: u128) -> Actor {
        Actor::active(
            address,
            balance,
            Code::new("Wallet", CodeKind::Account, 1),
            Contract::Account,
        )
    }

    #[test]
    fn test_insert_rejects_collision() {
        let mut registry = ActorRegistry::new();
        let addr = Address::derive("a", &[]);
        registry.insert(account(addr, 10)).unwrap();
        assert!(matches!(
            registry.insert(account(addr, 5)),
            Err(SimError::AddressCollision(a)) if a == addr
        ));
    }

    #[test]
    fn test_insert_merges_parked_value() {
        let mut registry = ActorRegistry::new();
        let addr = Address::derive("a", &[]);
        registry.credit(addr, 7).unwrap();
        assert!(!registry.is_active(&addr));
        assert_eq!(registry.balance(&addr), Some(7));
        registry.insert(account(addr, 10)).unwrap();
        assert!(registry.is_active(&addr));
        assert_eq!(registry.balance(&addr), Some(17));
    }

    #[test]
    fn test_remove_makes_balance_absent() {
        let mut registry = ActorRegistry::new();
        let addr = Address::derive("a", &[]);
        registry.insert(account(addr, 1)).unwrap();
        registry.remove(&addr);
        assert_eq!(registry.balance(&addr), None);
        assert!(!registry.contains(&addr));
    }

    #[test]
    fn test_total_balance() {
        let mut registry = ActorRegistry::new();
        registry.insert(account(Address::derive("a", &[]), 3)).unwrap();
        registry.insert(account(Address::derive("b", &[]), 4)).unwrap();
        registry.credit(Address::derive("c", &[]), 5).unwrap();
        assert_eq!(registry.total_balance(), Some(12));
        assert_eq!(registry.len(), 3);
    }
}

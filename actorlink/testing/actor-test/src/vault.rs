// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! A contract holding deposits on behalf of other actors.
//!
//! Owners can refer to themselves either by their canonical address or by their ID, so
//! the ledger is keyed by the normalized address, and withdrawals go through the safe
//! value transfer, making it a good target for reentrancy attacks.

use std::cell::RefCell;
use std::collections::BTreeMap;

use actorlink_vm_actor_interface::eam::RawAddress;
use actorlink_vm_core::Host;
use actorlink_vm_invoke::{send_value, TransferError};
use actorlink_vm_resolver::Normalizer;
use fvm_shared::bigint::BigInt;
use fvm_shared::econ::TokenAmount;
use num_traits::Zero;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("{owner} has {available} deposited, cannot withdraw {amount}")]
    Overdrawn {
        owner: RawAddress,
        available: TokenAmount,
        amount: TokenAmount,
    },
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Contract storage.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    deposits: BTreeMap<RawAddress, TokenAmount>,
}

impl Ledger {
    pub fn get(&self, key: &RawAddress) -> TokenAmount {
        self.deposits
            .get(key)
            .cloned()
            .unwrap_or_else(TokenAmount::zero)
    }

    fn set(&mut self, key: RawAddress, amount: TokenAmount) {
        if amount.is_zero() {
            self.deposits.remove(&key);
        } else {
            self.deposits.insert(key, amount);
        }
    }

    pub fn total(&self) -> TokenAmount {
        let total = self
            .deposits
            .values()
            .fold(BigInt::zero(), |acc, x| acc + x.atto());
        TokenAmount::from_atto(total)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&RawAddress, &TokenAmount)> {
        self.deposits.iter()
    }
}

/// The contract code; the storage lives outside of it, so that it can be re-entered.
pub struct Vault<'a, H> {
    host: &'a H,
    ledger: &'a RefCell<Ledger>,
    normalizer: Normalizer<'a, H>,
}

impl<'a, H> Vault<'a, H>
where
    H: Host,
{
    pub fn new(host: &'a H, ledger: &'a RefCell<Ledger>) -> Self {
        Self {
            host,
            ledger,
            normalizer: Normalizer::new(host),
        }
    }

    /// Record value that arrived from an owner.
    pub fn deposit(&self, owner: &RawAddress, amount: &TokenAmount) {
        let key = self.normalizer.normalize(owner);
        let mut ledger = self.ledger.borrow_mut();
        let balance = ledger.get(&key);
        ledger.set(key, TokenAmount::from_atto(balance.atto() + amount.atto()));
        tracing::debug!(%owner, %key, %amount, "deposit");
    }

    pub fn deposit_of(&self, owner: &RawAddress) -> TokenAmount {
        let key = self.normalizer.normalize(owner);
        self.ledger.borrow().get(&key)
    }

    /// Pay out part of a deposit to the owner.
    ///
    /// The ledger is debited before the value leaves, and credited back if the transfer fails.
    pub fn withdraw(&self, owner: &RawAddress, amount: &TokenAmount) -> Result<(), VaultError> {
        let key = self.normalizer.normalize(owner);
        let available = self.ledger.borrow().get(&key);

        if available < *amount {
            return Err(VaultError::Overdrawn {
                owner: *owner,
                available,
                amount: amount.clone(),
            });
        }

        self.ledger
            .borrow_mut()
            .set(key, TokenAmount::from_atto(available.atto() - amount.atto()));

        if let Err(e) = send_value(self.host, owner, amount) {
            let mut ledger = self.ledger.borrow_mut();
            let balance = ledger.get(&key);
            ledger.set(key, TokenAmount::from_atto(balance.atto() + amount.atto()));
            return Err(e.into());
        }

        tracing::debug!(%owner, %key, %amount, "withdrawal");

        Ok(())
    }
}

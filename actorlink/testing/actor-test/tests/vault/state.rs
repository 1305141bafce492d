// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::BTreeMap;

use actorlink_vm_actor_interface::eam::{encode, RawAddress};
use arbitrary::Unstructured;
use fvm_shared::ActorID;

/// An actor keeping a deposit in the vault.
#[derive(Debug, Clone)]
pub struct Owner {
    pub id: ActorID,
    /// Actors without a delegated address are only known by their ID.
    pub delegated: Option<RawAddress>,
    /// Refuses any value sent to it.
    pub rejecting: bool,
}

impl Owner {
    /// The address the owner uses in a call; without a delegated address it's always the ID.
    pub fn addr(&self, by_id: bool) -> RawAddress {
        match self.delegated {
            Some(addr) if !by_id => addr,
            _ => encode(self.id),
        }
    }

    /// The address the vault keys the owner's deposit by.
    pub fn key(&self) -> RawAddress {
        self.delegated.unwrap_or_else(|| encode(self.id))
    }
}

#[derive(Debug, Clone)]
pub struct VaultState {
    pub owners: Vec<Owner>,
    /// Deposits by index of the owner.
    pub deposits: BTreeMap<usize, u64>,
    /// Balance of the vault, including funds nobody has a claim on.
    pub balance: u64,
    /// Sum of all balances in the system.
    pub total: u64,
}

impl VaultState {
    pub fn arbitrary(u: &mut Unstructured) -> arbitrary::Result<Self> {
        let n: usize = u.int_in_range(1..=5)?;
        let mut owners = Vec::new();

        for i in 0..n {
            let delegated = if u.arbitrary::<bool>()? {
                Some(RawAddress([0x10 + i as u8; 20]))
            } else {
                None
            };
            owners.push(Owner {
                id: 1000 + i as ActorID,
                delegated,
                rejecting: u.int_in_range(0..=4)? == 0,
            });
        }

        let balance = u.int_in_range(0..=1000)?;

        Ok(Self {
            owners,
            deposits: BTreeMap::new(),
            balance,
            total: balance,
        })
    }

    pub fn deposit_of(&self, owner: usize) -> u64 {
        self.deposits.get(&owner).cloned().unwrap_or_default()
    }

    pub fn total_deposits(&self) -> u64 {
        self.deposits.values().sum()
    }
}

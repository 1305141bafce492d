// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::Path;

use actorlink_vm_actor_interface::eam::RawAddress;
use config::{Config, ConfigError, Environment, File};
use fvm_shared::econ::TokenAmount;
use fvm_shared::ActorID;
use serde::Deserialize;

use super::MockHost;

/// An actor known to the resolution authority.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DelegatedEntry {
    pub id: ActorID,
    pub address: RawAddress,
}

/// The world a contract runs in during a test: its own balance, what the
/// resolution authority knows, and which recipients refuse value.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Address of the contract under test.
    pub address: RawAddress,
    /// Balance of the contract, in atto.
    pub balance: u64,
    #[serde(default)]
    pub delegated: Vec<DelegatedEntry>,
    #[serde(default)]
    pub rejecting: Vec<RawAddress>,
}

impl Scenario {
    /// Load `default.toml` from the directory, overlaid by `<name>.toml` if it exists,
    /// overlaid by `ACTORLINK_*` environment variables.
    pub fn new(dir: &Path, name: &str) -> Result<Self, ConfigError> {
        let c = Config::builder()
            .add_source(File::from(dir.join("default")))
            .add_source(File::from(dir.join(name)).required(false))
            .add_source(
                Environment::with_prefix("actorlink")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        c.try_deserialize()
    }

    pub fn into_host(self) -> MockHost {
        let host = MockHost::new(self.address, TokenAmount::from_atto(self.balance));

        let host = self
            .delegated
            .into_iter()
            .fold(host, |host, e| host.with_delegated(e.id, e.address));

        self.rejecting
            .into_iter()
            .fold(host, |host, addr| host.with_rejecting(addr))
    }
}

// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::{Path, PathBuf};

use actorlink_testing::mock::Scenario;
use anyhow::Context;

pub mod vault;

/// Directory of the scenario files shipped with this crate.
pub fn scenarios_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios")
}

/// Load a named scenario on top of the defaults.
pub fn scenario(name: &str) -> anyhow::Result<Scenario> {
    Scenario::new(&scenarios_dir(), name)
        .with_context(|| format!("failed to load scenario {name}"))
}

/// Show the library logs in test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

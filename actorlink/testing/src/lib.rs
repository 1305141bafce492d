// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
#[cfg(feature = "mock")]
pub mod mock;
#[cfg(feature = "smt")]
pub mod smt;

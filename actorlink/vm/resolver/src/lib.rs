// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Translate between the two ways an actor can be addressed from the EVM.
//!
//! The [`Resolver`] asks the resolution authority (the FEVM precompiles) for the
//! mapping between actor IDs and delegated addresses. The [`Normalizer`] builds on it
//! to turn ID-masked addresses into their canonical form, which is what should be
//! used as a key wherever identity matters, e.g. balances in a token contract.

mod error;
mod normalize;
mod resolver;

pub use error::ResolveError;
pub use normalize::Normalizer;
pub use resolver::Resolver;

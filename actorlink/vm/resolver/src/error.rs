// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use actorlink_vm_actor_interface::eam::RawAddress;
use fvm_shared::ActorID;
use thiserror::Error;

/// The resolution authority had no usable answer.
///
/// All variants amount to "not found"; a response that isn't exactly what we expect
/// is never interpreted as a partial answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("actor {0} has no delegated address")]
    NoDelegatedAddress(ActorID),
    #[error("address {0} is not assigned to an actor")]
    NoActorId(RawAddress),
    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse {
        endpoint: RawAddress,
        reason: String,
    },
}

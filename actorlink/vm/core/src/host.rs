// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use actorlink_vm_actor_interface::eam::RawAddress;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::sys::SendFlags;

/// Whether the callee is allowed to change state.
///
/// Decided by the caller for every call; a read-only call in which the callee
/// tries to mutate anything fails as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallMode {
    Mutating,
    ReadOnly,
}

impl CallMode {
    pub fn is_read_only(&self) -> bool {
        matches!(self, CallMode::ReadOnly)
    }

    /// The flags the runtime expects in a call envelope.
    pub fn flags(&self) -> SendFlags {
        match self {
            CallMode::Mutating => SendFlags::empty(),
            CallMode::ReadOnly => SendFlags::READ_ONLY,
        }
    }

    /// Interpret the flags of a call envelope; anything other than the read-only bit is ignored.
    pub fn from_flags(flags: u64) -> Self {
        if flags & SendFlags::READ_ONLY.bits() != 0 {
            CallMode::ReadOnly
        } else {
            CallMode::Mutating
        }
    }
}

/// Services the execution environment provides to the executing contract.
///
/// Every method takes `&self` because an outgoing call can re-enter the caller on the
/// same stack before it returns; implementations keep their state behind interior mutability.
///
/// Failures are reported with the exit code of the callee or the runtime. Whatever the callee
/// did before failing is rolled back by the runtime, not by the caller.
pub trait Host {
    /// Balance of the currently executing actor.
    fn balance(&self) -> TokenAmount;

    /// Transfer `value` to `to`, running whatever code the recipient has.
    ///
    /// The value is debited from the caller before the recipient is entered.
    /// A `gas_limit` of `None` forwards all the remaining gas.
    fn send_value(
        &self,
        to: &RawAddress,
        value: &TokenAmount,
        gas_limit: Option<u64>,
    ) -> Result<(), ExitCode>;

    /// Call one of the well-known endpoints with raw input, returning its raw output.
    fn call_endpoint(
        &self,
        endpoint: &RawAddress,
        input: &[u8],
        mode: CallMode,
    ) -> Result<Vec<u8>, ExitCode>;
}

// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use actorlink_vm_actor_interface::eam::{CanonicalAddress, RawAddress};
use actorlink_vm_actor_interface::precompiles::{LOOKUP_DELEGATED_ADDRESS, RESOLVE_ADDRESS};
use actorlink_vm_core::{CallMode, Host};
use fvm_shared::ActorID;

use crate::ResolveError;

/// Length of an ABI word, which is how the actor ID comes back.
const WORD_LEN: usize = 32;

/// Read-only point lookups against the resolution authority.
///
/// Every method makes at most one query, and never in a mode that could change state.
pub struct Resolver<'h, H> {
    host: &'h H,
}

impl<'h, H> Resolver<'h, H>
where
    H: Host,
{
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Look up the delegated address of an actor.
    ///
    /// Only a 22 byte delegated EAM address is accepted; anything else, including a
    /// sub-address which looks like a masked ID, is rejected rather than guessed at.
    pub fn id_to_canonical(&self, id: ActorID) -> Result<CanonicalAddress, ResolveError> {
        let out = match self.host.call_endpoint(
            &LOOKUP_DELEGATED_ADDRESS,
            &id.to_be_bytes(),
            CallMode::ReadOnly,
        ) {
            Ok(out) => out,
            Err(exit_code) => {
                tracing::debug!(
                    id,
                    exit_code = exit_code.value(),
                    "delegated address lookup failed"
                );
                return Err(ResolveError::NoDelegatedAddress(id));
            }
        };

        if out.is_empty() {
            tracing::debug!(id, "actor has no delegated address");
            return Err(ResolveError::NoDelegatedAddress(id));
        }

        let addr = RawAddress::from_tagged(&out)
            .map_err(|e| malformed(LOOKUP_DELEGATED_ADDRESS, e.to_string(), &out))?;

        CanonicalAddress::new(addr)
            .map_err(|e| malformed(LOOKUP_DELEGATED_ADDRESS, e.to_string(), &out))
    }

    /// Look up the ID of the actor behind an address.
    ///
    /// A masked ID resolves to itself without asking the authority.
    pub fn canonical_to_id(&self, addr: &RawAddress) -> Result<ActorID, ResolveError> {
        if let Some(id) = addr.as_id() {
            return Ok(id);
        }

        let out = match self
            .host
            .call_endpoint(&RESOLVE_ADDRESS, &addr.to_tagged(), CallMode::ReadOnly)
        {
            Ok(out) => out,
            Err(exit_code) => {
                tracing::debug!(
                    %addr,
                    exit_code = exit_code.value(),
                    "address resolution failed"
                );
                return Err(ResolveError::NoActorId(*addr));
            }
        };

        if out.is_empty() {
            tracing::debug!(%addr, "address is not assigned to an actor");
            return Err(ResolveError::NoActorId(*addr));
        }

        if out.len() != WORD_LEN {
            return Err(malformed(
                RESOLVE_ADDRESS,
                format!("expected {WORD_LEN} bytes, got {}", out.len()),
                &out,
            ));
        }

        let (high, low) = out.split_at(WORD_LEN - 8);

        if high.iter().any(|b| *b != 0) {
            return Err(malformed(
                RESOLVE_ADDRESS,
                "actor ID does not fit into 64 bits".to_owned(),
                &out,
            ));
        }

        let mut id = [0u8; 8];
        id.copy_from_slice(low);

        Ok(ActorID::from_be_bytes(id))
    }
}

fn malformed(endpoint: RawAddress, reason: String, out: &[u8]) -> ResolveError {
    tracing::warn!(
        %endpoint,
        response = hex::encode(out),
        reason = %reason,
        "malformed response from the resolution authority"
    );
    ResolveError::MalformedResponse { endpoint, reason }
}

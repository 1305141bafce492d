// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use actorlink_vm_actor_interface::precompiles::CALL_ACTOR_ID;
use actorlink_vm_core::Host;
use fvm_ipld_encoding::RawBytes;
use fvm_shared::econ::TokenAmount;
use fvm_shared::{ActorID, MethodNum};

use crate::{ActorCall, ActorResponse, InvocationError};

/// Call other actors by ID through the call-by-ID endpoint.
pub struct Invoker<'h, H> {
    host: &'h H,
}

impl<'h, H> Invoker<'h, H>
where
    H: Host,
{
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Invoke a method, allowing the target to change state and receive value.
    ///
    /// Returns the raw output of the endpoint.
    pub fn invoke(
        &self,
        actor_id: ActorID,
        method: MethodNum,
        value: TokenAmount,
        codec: u64,
        params: RawBytes,
    ) -> Result<Vec<u8>, InvocationError> {
        self.dispatch(&ActorCall::mutating(
            actor_id, method, value, codec, params,
        ))
    }

    /// Invoke a method without value, such that any attempt by the target
    /// to change state makes the call fail.
    pub fn invoke_read_only(
        &self,
        actor_id: ActorID,
        method: MethodNum,
        codec: u64,
        params: RawBytes,
    ) -> Result<Vec<u8>, InvocationError> {
        self.dispatch(&ActorCall::read_only(actor_id, method, codec, params))
    }

    /// Validate and send the envelope. Nothing leaves the contract if the call is invalid.
    pub fn dispatch(&self, call: &ActorCall) -> Result<Vec<u8>, InvocationError> {
        let input = call.encode()?;

        tracing::debug!(
            actor_id = call.actor_id,
            method = call.method,
            value = %call.value,
            mode = ?call.mode,
            "invoking actor"
        );

        self.host
            .call_endpoint(&CALL_ACTOR_ID, &input, call.mode)
            .map_err(|exit_code| {
                tracing::warn!(
                    actor_id = call.actor_id,
                    method = call.method,
                    exit_code = exit_code.value(),
                    "actor invocation failed"
                );
                InvocationError::Failed(exit_code)
            })
    }

    /// Dispatch the call and decode the response, failing unless the actor succeeded.
    pub fn call(&self, call: &ActorCall) -> Result<ActorResponse, InvocationError> {
        let output = self.dispatch(call)?;
        let response = ActorResponse::decode(&output)?;

        if !response.exit_code.is_success() {
            tracing::debug!(
                actor_id = call.actor_id,
                exit_code = response.exit_code.value(),
                "actor returned an error"
            );
            return Err(InvocationError::Aborted(response.exit_code));
        }

        Ok(response)
    }
}

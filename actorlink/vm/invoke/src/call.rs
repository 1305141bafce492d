// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use actorlink_vm_core::CallMode;
use ethers_core::abi::{self, ParamType, Token};
use ethers_core::types as et;
use fvm_ipld_encoding::RawBytes;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::{ActorID, MethodNum};
use num_traits::Zero;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::conv::{tokens_to_u256, u256_to_tokens, u256_to_u64};
use crate::InvocationError;

/// IPLD codecs the parameters and return data can be tagged with.
pub mod codec {
    /// No parameters; the params must be empty.
    pub const NO_PARAMS: u64 = 0;
    pub const CBOR: u64 = 0x51;
    pub const IPLD_RAW: u64 = 0x55;
    pub const DAG_CBOR: u64 = 0x71;
}

/// A call to another actor, addressed by ID, as it is handed to the call-by-ID endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorCall {
    pub actor_id: ActorID,
    pub method: MethodNum,
    pub value: TokenAmount,
    pub codec: u64,
    pub params: RawBytes,
    pub mode: CallMode,
}

impl ActorCall {
    pub fn mutating(
        actor_id: ActorID,
        method: MethodNum,
        value: TokenAmount,
        codec: u64,
        params: RawBytes,
    ) -> Self {
        Self {
            actor_id,
            method,
            value,
            codec,
            params,
            mode: CallMode::Mutating,
        }
    }

    /// A call the target cannot use to change any state; it never carries value.
    pub fn read_only(actor_id: ActorID, method: MethodNum, codec: u64, params: RawBytes) -> Self {
        Self {
            actor_id,
            method,
            value: TokenAmount::zero(),
            codec,
            params,
            mode: CallMode::ReadOnly,
        }
    }

    /// Serialize the parameters as DAG-CBOR.
    pub fn cbor<P: Serialize>(
        actor_id: ActorID,
        method: MethodNum,
        value: TokenAmount,
        params: &P,
        mode: CallMode,
    ) -> Result<Self, InvocationError> {
        Ok(Self {
            actor_id,
            method,
            value,
            codec: codec::DAG_CBOR,
            params: RawBytes::serialize(params)?,
            mode,
        })
    }

    /// Check the call can be dispatched at all.
    pub fn validate(&self) -> Result<(), InvocationError> {
        if self.mode.is_read_only() && !self.value.is_zero() {
            return Err(InvocationError::ReadOnlyWithValue(self.value.clone()));
        }
        tokens_to_u256(&self.value)?;
        Ok(())
    }

    /// ABI encode the envelope:
    /// `(uint64 method, uint256 value, uint64 flags, uint64 codec, bytes params, uint64 id)`
    pub fn encode(&self) -> Result<Vec<u8>, InvocationError> {
        self.validate()?;

        let value = tokens_to_u256(&self.value)?;

        Ok(abi::encode(&[
            Token::Uint(self.method.into()),
            Token::Uint(value),
            Token::Uint(self.mode.flags().bits().into()),
            Token::Uint(self.codec.into()),
            Token::Bytes(self.params.bytes().to_vec()),
            Token::Uint(self.actor_id.into()),
        ]))
    }

    /// Parse an envelope, the way the target side of the endpoint sees it.
    pub fn decode(bytes: &[u8]) -> Result<Self, InvocationError> {
        let tokens = abi::decode(
            &[
                ParamType::Uint(64),
                ParamType::Uint(256),
                ParamType::Uint(64),
                ParamType::Uint(64),
                ParamType::Bytes,
                ParamType::Uint(64),
            ],
            bytes,
        )
        .map_err(|e| InvocationError::MalformedEnvelope(e.to_string()))?;

        match tokens.as_slice() {
            [Token::Uint(method), Token::Uint(value), Token::Uint(flags), Token::Uint(codec), Token::Bytes(params), Token::Uint(actor_id)] => {
                Ok(Self {
                    actor_id: u256_to_u64(actor_id, "actor ID")?,
                    method: u256_to_u64(method, "method")?,
                    value: u256_to_tokens(value),
                    codec: u256_to_u64(codec, "codec")?,
                    params: RawBytes::new(params.clone()),
                    mode: CallMode::from_flags(u256_to_u64(flags, "flags")?),
                })
            }
            other => Err(InvocationError::MalformedEnvelope(format!(
                "unexpected tokens: {other:?}"
            ))),
        }
    }
}

/// What the call-by-ID endpoint returns: `(int256 exit_code, uint64 codec, bytes data)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorResponse {
    pub exit_code: ExitCode,
    pub codec: u64,
    pub data: RawBytes,
}

impl ActorResponse {
    pub fn ok(codec: u64, data: RawBytes) -> Self {
        Self {
            exit_code: ExitCode::OK,
            codec,
            data,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[
            Token::Int(et::U256::from(self.exit_code.value())),
            Token::Uint(self.codec.into()),
            Token::Bytes(self.data.bytes().to_vec()),
        ])
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, InvocationError> {
        let tokens = abi::decode(
            &[ParamType::Int(256), ParamType::Uint(64), ParamType::Bytes],
            bytes,
        )
        .map_err(|e| InvocationError::MalformedResponse(e.to_string()))?;

        match tokens.as_slice() {
            [Token::Int(exit_code), Token::Uint(codec), Token::Bytes(data)] => {
                // Negative exit codes come from the endpoint itself, not the actor.
                if exit_code.bit(255) || exit_code.bits() > 32 {
                    return Err(InvocationError::MalformedResponse(format!(
                        "exit code out of range: {exit_code:#x}"
                    )));
                }
                if codec.bits() > 64 {
                    return Err(InvocationError::MalformedResponse(format!(
                        "codec out of range: {codec}"
                    )));
                }
                Ok(Self {
                    exit_code: ExitCode::new(exit_code.low_u32()),
                    codec: codec.low_u64(),
                    data: RawBytes::new(data.clone()),
                })
            }
            other => Err(InvocationError::MalformedResponse(format!(
                "unexpected tokens: {other:?}"
            ))),
        }
    }

    /// Return the data if the actor succeeded.
    pub fn into_result(self) -> Result<RawBytes, InvocationError> {
        if self.exit_code.is_success() {
            Ok(self.data)
        } else {
            Err(InvocationError::Aborted(self.exit_code))
        }
    }

    /// Deserialize CBOR return data.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, InvocationError> {
        match self.codec {
            codec::CBOR | codec::DAG_CBOR => Ok(self.data.deserialize()?),
            other => Err(InvocationError::MalformedResponse(format!(
                "cannot deserialize data with codec {other:#x}"
            ))),
        }
    }
}

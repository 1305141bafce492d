// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Helper methods to convert between FVM and Ethereum ABI data formats.

use ethers_core::types as et;
use fvm_shared::bigint::{BigInt, Sign};
use fvm_shared::econ::TokenAmount;

use crate::InvocationError;

/// Convert tokens to the `uint256` the EVM uses for value.
pub fn tokens_to_u256(amount: &TokenAmount) -> Result<et::U256, InvocationError> {
    let (sign, bytes) = amount.atto().to_bytes_be();
    if sign == Sign::Minus || bytes.len() > 32 {
        return Err(InvocationError::ValueOutOfRange(amount.clone()));
    }
    Ok(et::U256::from_big_endian(&bytes))
}

pub fn u256_to_tokens(value: &et::U256) -> TokenAmount {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    TokenAmount::from_atto(BigInt::from_bytes_be(Sign::Plus, &bytes))
}

/// Narrow an ABI word to `u64`; the ABI decoder doesn't check that the high bits are empty.
pub(crate) fn u256_to_u64(value: &et::U256, what: &str) -> Result<u64, InvocationError> {
    if value.bits() > 64 {
        return Err(InvocationError::MalformedEnvelope(format!(
            "{what} does not fit into 64 bits: {value}"
        )));
    }
    Ok(value.low_u64())
}

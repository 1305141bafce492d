// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Well-known addresses of the FEVM precompiles we talk to.
//!
//! See <https://docs.filecoin.io/smart-contracts/filecoin-evm-runtime/precompiles>

// Takes a delegated address in binary form, returns the actor ID as a 32 byte word,
// or nothing if the address is not assigned.
define_precompile!(RESOLVE_ADDRESS = 1);

// Takes an 8 byte actor ID, returns the delegated address in binary form,
// or nothing if the actor doesn't have one.
define_precompile!(LOOKUP_DELEGATED_ADDRESS = 2);

// Takes an ABI encoded call envelope, invokes the actor with the given ID.
define_precompile!(CALL_ACTOR_ID = 5);

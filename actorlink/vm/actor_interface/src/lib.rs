// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The address shapes and well-known endpoints an FEVM contract deals with.
//!
//! Nothing in here talks to the runtime; these are the pure building blocks
//! the resolver and the invocation adapter are written against.

/// Define a well-known singleton actor by its ID.
macro_rules! define_id {
    ($name:ident { id: $id:literal }) => {
        paste::paste! {
            pub const [<$name _ACTOR_ID>]: fvm_shared::ActorID = $id;
        }
    };
}

/// Define a precompile living at `0xfe00..00<index>`.
macro_rules! define_precompile {
    ($name:ident = $index:literal) => {
        paste::paste! {
            pub const [<$name _INDEX>]: u8 = $index;
            pub const $name: $crate::eam::RawAddress =
                $crate::eam::RawAddress::precompile([<$name _INDEX>]);
        }
    };
}

#[cfg(feature = "arb")]
mod arb;
pub mod eam;
pub mod precompiles;

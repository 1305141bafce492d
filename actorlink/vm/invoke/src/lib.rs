// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Moving value and calling other actors from an FEVM contract.

mod call;
mod conv;
mod error;
mod invoker;
mod transfer;

pub use call::{codec, ActorCall, ActorResponse};
pub use conv::{tokens_to_u256, u256_to_tokens};
pub use error::{InvocationError, TransferError};
pub use invoker::Invoker;
pub use transfer::send_value;

// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use actorlink_vm_actor_interface::eam::RawAddress;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("cannot transfer a negative amount: {0}")]
    InvalidAmount(TokenAmount),
    #[error("insufficient funds: balance is {balance}, transfer needs {amount}")]
    InsufficientFunds {
        balance: TokenAmount,
        amount: TokenAmount,
    },
    /// The recipient doesn't exist, refused the value, or can't receive value at all;
    /// these cases are deliberately not told apart.
    #[error("recipient {0} rejected the transfer")]
    RecipientRejected(RawAddress),
}

#[derive(Error, Debug)]
pub enum InvocationError {
    /// Programming error: a read-only call was asked to carry value.
    #[error("read-only calls cannot carry value; got {0}")]
    ReadOnlyWithValue(TokenAmount),
    #[error("value {0} does not fit into uint256")]
    ValueOutOfRange(TokenAmount),
    #[error("failed to encode params")]
    Params(#[from] fvm_ipld_encoding::Error),
    #[error("invocation failed with exit code {}", .0.value())]
    Failed(ExitCode),
    #[error("actor returned exit code {}", .0.value())]
    Aborted(ExitCode),
    #[error("malformed call envelope: {0}")]
    MalformedEnvelope(String),
    #[error("malformed actor response: {0}")]
    MalformedResponse(String),
}

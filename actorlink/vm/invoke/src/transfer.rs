// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use actorlink_vm_actor_interface::eam::RawAddress;
use actorlink_vm_core::Host;
use fvm_shared::bigint::Sign;
use fvm_shared::econ::TokenAmount;

use crate::TransferError;

/// Send value to a recipient, forwarding all remaining gas.
///
/// The balance is checked before anything leaves the contract, and the host debits it
/// before the recipient runs, so a recipient re-entering the contract sees the reduced
/// balance and cannot get paid twice out of the same funds.
///
/// The recipient can be either a canonical or an ID-masked address; the host routes
/// both to the same actor.
pub fn send_value<H: Host>(
    host: &H,
    recipient: &RawAddress,
    amount: &TokenAmount,
) -> Result<(), TransferError> {
    if amount.atto().sign() == Sign::Minus {
        return Err(TransferError::InvalidAmount(amount.clone()));
    }

    let balance = host.balance();

    if balance < *amount {
        return Err(TransferError::InsufficientFunds {
            balance,
            amount: amount.clone(),
        });
    }

    host.send_value(recipient, amount, None).map_err(|exit_code| {
        tracing::warn!(
            %recipient,
            %amount,
            exit_code = exit_code.value(),
            "value transfer failed"
        );
        TransferError::RecipientRejected(*recipient)
    })?;

    tracing::debug!(%recipient, %amount, "value transferred");

    Ok(())
}

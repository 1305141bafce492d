// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! An in-memory [`Host`] emulating the FEVM precompiles and value transfers,
//! recording every call that leaves the contract.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use actorlink_vm_actor_interface::eam::RawAddress;
use actorlink_vm_actor_interface::precompiles::{
    CALL_ACTOR_ID, LOOKUP_DELEGATED_ADDRESS, RESOLVE_ADDRESS,
};
use actorlink_vm_core::{CallMode, Host};
use fvm_shared::bigint::{BigInt, Sign};
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::ActorID;
use num_traits::Zero;

mod scenario;

pub use scenario::{DelegatedEntry, Scenario};

/// Code run by the recipient of a value transfer, after it has been credited.
pub type ReceiveHook = Rc<dyn Fn(&MockHost, &RawAddress, &TokenAmount) -> Result<(), ExitCode>>;

/// Code run by the target of a `CALL_ACTOR_ID` dispatch; gets the raw envelope.
pub type ActorHandler = Rc<dyn Fn(&MockHost, &[u8], CallMode) -> Result<Vec<u8>, ExitCode>>;

/// A call that left the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Send {
        to: RawAddress,
        value: TokenAmount,
        gas_limit: Option<u64>,
    },
    Endpoint {
        endpoint: RawAddress,
        input: Vec<u8>,
        mode: CallMode,
    },
}

pub struct MockHost {
    /// The contract we are executing as.
    address: RawAddress,
    balances: RefCell<BTreeMap<RawAddress, TokenAmount>>,
    /// The resolution authority's view: actors which have a delegated address.
    delegated: BTreeMap<ActorID, RawAddress>,
    /// Canned replies overriding the emulated endpoints.
    replies: HashMap<RawAddress, Result<Vec<u8>, ExitCode>>,
    /// Recipients which refuse any value.
    rejecting: BTreeSet<RawAddress>,
    on_receive: Option<ReceiveHook>,
    on_call: Option<ActorHandler>,
    calls: RefCell<Vec<HostCall>>,
    /// Number of read-only actor calls currently on the stack.
    read_only: Cell<u32>,
}

impl MockHost {
    pub fn new(address: RawAddress, balance: TokenAmount) -> Self {
        Self {
            address,
            balances: RefCell::new(BTreeMap::from([(address, balance)])),
            delegated: Default::default(),
            replies: Default::default(),
            rejecting: Default::default(),
            on_receive: None,
            on_call: None,
            calls: Default::default(),
            read_only: Cell::new(0),
        }
    }

    /// Let the resolution authority know about a delegated address.
    pub fn with_delegated(mut self, id: ActorID, addr: RawAddress) -> Self {
        self.delegated.insert(id, addr);
        self
    }

    /// Return a fixed reply from an endpoint, no matter the input.
    pub fn with_reply(mut self, endpoint: RawAddress, reply: Result<Vec<u8>, ExitCode>) -> Self {
        self.replies.insert(endpoint, reply);
        self
    }

    pub fn with_rejecting(mut self, addr: RawAddress) -> Self {
        self.rejecting.insert(addr);
        self
    }

    pub fn with_receive_hook<F>(mut self, f: F) -> Self
    where
        F: Fn(&MockHost, &RawAddress, &TokenAmount) -> Result<(), ExitCode> + 'static,
    {
        self.on_receive = Some(Rc::new(f));
        self
    }

    pub fn with_actor_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&MockHost, &[u8], CallMode) -> Result<Vec<u8>, ExitCode> + 'static,
    {
        self.on_call = Some(Rc::new(f));
        self
    }

    pub fn address(&self) -> RawAddress {
        self.address
    }

    pub fn balance_of(&self, addr: &RawAddress) -> TokenAmount {
        self.balances
            .borrow()
            .get(addr)
            .cloned()
            .unwrap_or_else(TokenAmount::zero)
    }

    /// Sum of all balances; transfers should never change it.
    pub fn total_balance(&self) -> TokenAmount {
        let total = self
            .balances
            .borrow()
            .values()
            .fold(BigInt::zero(), |acc, b| acc + b.atto());
        TokenAmount::from_atto(total)
    }

    /// Add funds to an account from outside the system, e.g. value arriving with a message.
    pub fn credit(&self, to: &RawAddress, value: &TokenAmount) {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.get(to).cloned().unwrap_or_else(TokenAmount::zero);
        balances.insert(*to, TokenAmount::from_atto(balance.atto() + value.atto()));
    }

    /// All the calls made so far, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Whether we are anywhere inside a read-only actor call.
    pub fn is_read_only(&self) -> bool {
        self.read_only.get() > 0
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }

    /// Move funds out of our own account; the recipient hasn't run yet.
    fn debit_and_credit(&self, to: &RawAddress, value: &TokenAmount) -> Result<(), ExitCode> {
        let mut balances = self.balances.borrow_mut();
        let from = balances
            .get(&self.address)
            .cloned()
            .unwrap_or_else(TokenAmount::zero);

        if value.atto().sign() == Sign::Minus || from.atto() < value.atto() {
            return Err(ExitCode::SYS_INSUFFICIENT_FUNDS);
        }

        balances.insert(self.address, TokenAmount::from_atto(from.atto() - value.atto()));

        let to_balance = balances.get(to).cloned().unwrap_or_else(TokenAmount::zero);
        balances.insert(*to, TokenAmount::from_atto(to_balance.atto() + value.atto()));

        Ok(())
    }

    fn lookup_delegated_address(&self, input: &[u8]) -> Result<Vec<u8>, ExitCode> {
        let id: [u8; 8] = input
            .try_into()
            .map_err(|_| ExitCode::USR_ILLEGAL_ARGUMENT)?;
        let id = ActorID::from_be_bytes(id);

        Ok(self
            .delegated
            .get(&id)
            .map(|addr| addr.to_tagged().to_vec())
            .unwrap_or_default())
    }

    fn resolve_address(&self, input: &[u8]) -> Result<Vec<u8>, ExitCode> {
        let addr = RawAddress::from_tagged(input).map_err(|_| ExitCode::USR_ILLEGAL_ARGUMENT)?;

        let id = self
            .delegated
            .iter()
            .find_map(|(id, a)| if *a == addr { Some(*id) } else { None });

        Ok(id
            .map(|id| {
                let mut word = vec![0u8; 24];
                word.extend_from_slice(&id.to_be_bytes());
                word
            })
            .unwrap_or_default())
    }
}

impl Host for MockHost {
    fn balance(&self) -> TokenAmount {
        self.balance_of(&self.address)
    }

    fn send_value(
        &self,
        to: &RawAddress,
        value: &TokenAmount,
        gas_limit: Option<u64>,
    ) -> Result<(), ExitCode> {
        self.record(HostCall::Send {
            to: *to,
            value: value.clone(),
            gas_limit,
        });

        // Moving value is a state change, which a read-only call cannot make.
        if self.is_read_only() && !value.is_zero() {
            return Err(ExitCode::USR_READ_ONLY);
        }

        // Everything the recipient does is rolled back if it fails, including nested transfers.
        let snapshot = self.balances.borrow().clone();

        self.debit_and_credit(to, value)?;

        let res = if self.rejecting.contains(to) {
            Err(ExitCode::USR_FORBIDDEN)
        } else if let Some(hook) = self.on_receive.clone() {
            hook(self, to, value)
        } else {
            Ok(())
        };

        if res.is_err() {
            *self.balances.borrow_mut() = snapshot;
        }

        res
    }

    fn call_endpoint(
        &self,
        endpoint: &RawAddress,
        input: &[u8],
        mode: CallMode,
    ) -> Result<Vec<u8>, ExitCode> {
        self.record(HostCall::Endpoint {
            endpoint: *endpoint,
            input: input.to_vec(),
            mode,
        });

        if let Some(reply) = self.replies.get(endpoint) {
            return reply.clone();
        }

        if *endpoint == LOOKUP_DELEGATED_ADDRESS {
            self.lookup_delegated_address(input)
        } else if *endpoint == RESOLVE_ADDRESS {
            self.resolve_address(input)
        } else if *endpoint == CALL_ACTOR_ID {
            match self.on_call.clone() {
                Some(handler) => {
                    // Calls made from inside a read-only call are read-only themselves.
                    let mode = if self.is_read_only() {
                        CallMode::ReadOnly
                    } else {
                        mode
                    };
                    let snapshot = self.balances.borrow().clone();
                    if mode.is_read_only() {
                        self.read_only.set(self.read_only.get() + 1);
                    }
                    let res = handler(self, input, mode);
                    if mode.is_read_only() {
                        self.read_only.set(self.read_only.get() - 1);
                    }
                    if res.is_err() {
                        *self.balances.borrow_mut() = snapshot;
                    }
                    res
                }
                None => Err(ExitCode::SYS_INVALID_RECEIVER),
            }
        } else {
            Err(ExitCode::SYS_INVALID_RECEIVER)
        }
    }
}

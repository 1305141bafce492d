// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use actor_test::vault::{Ledger, Vault, VaultError};
use actorlink_testing::mock::MockHost;
use actorlink_testing::smt::StateMachine;
use actorlink_vm_actor_interface::eam::RawAddress;
use actorlink_vm_core::Host;
use actorlink_vm_invoke::TransferError;
use arbitrary::Unstructured;
use fvm_shared::econ::TokenAmount;

use super::state::{Owner, VaultState};

const VAULT: RawAddress = RawAddress([0xcc; 20]);

/// System Under Test for the vault.
pub struct VaultSystem {
    host: MockHost,
    ledger: Rc<RefCell<Ledger>>,
    /// How many more times recipients try to re-enter the vault during the current command.
    reentries: Rc<Cell<u8>>,
    owners: Vec<Owner>,
}

#[derive(Debug, Clone)]
pub enum VaultCommand {
    /// Value arrives from the owner.
    Deposit {
        owner: usize,
        amount: u64,
        by_id: bool,
    },
    /// Withdraw, with the recipient trying to withdraw the same amount again while being paid.
    Withdraw {
        owner: usize,
        amount: u64,
        by_id: bool,
        reentries: u8,
    },
}

/// What the model expects to happen to a withdrawal.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    /// Number of payouts made, including the reentrant ones.
    Paid(u64),
    Overdrawn,
    Rejected,
}

fn withdrawal(state: &VaultState, owner: usize, amount: u64, reentries: u8) -> Outcome {
    let available = state.deposit_of(owner);
    if amount > available {
        Outcome::Overdrawn
    } else if state.owners[owner].rejecting {
        Outcome::Rejected
    } else if amount == 0 {
        Outcome::Paid(1 + reentries as u64)
    } else {
        Outcome::Paid((1 + reentries as u64).min(available / amount))
    }
}

fn atto(n: u64) -> TokenAmount {
    TokenAmount::from_atto(n)
}

pub struct VaultMachine;

impl StateMachine for VaultMachine {
    type System = VaultSystem;

    type State = VaultState;

    type Command = VaultCommand;

    type Result = Result<(), VaultError>;

    fn gen_state(&self, u: &mut Unstructured) -> arbitrary::Result<Self::State> {
        VaultState::arbitrary(u)
    }

    fn new_system(&self, state: &Self::State) -> Self::System {
        let ledger = Rc::new(RefCell::new(Ledger::default()));
        let reentries = Rc::new(Cell::new(0u8));

        let hook_ledger = ledger.clone();
        let hook_reentries = reentries.clone();

        let mut host = MockHost::new(VAULT, atto(state.balance)).with_receive_hook(
            move |host, to, value| {
                let n = hook_reentries.get();
                if n > 0 {
                    hook_reentries.set(n - 1);
                    // The recipient accepts the value it already got either way; the reentrant
                    // withdrawal can only be paid or refused for lack of deposit.
                    let res = Vault::new(host, &hook_ledger).withdraw(to, value);
                    assert!(
                        matches!(res, Ok(()) | Err(VaultError::Overdrawn { .. })),
                        "unexpected reentrant withdrawal result: {res:?}"
                    );
                }
                Ok(())
            },
        );

        for owner in state.owners.iter() {
            if let Some(addr) = owner.delegated {
                host = host.with_delegated(owner.id, addr);
            }
            if owner.rejecting {
                host = host
                    .with_rejecting(owner.addr(true))
                    .with_rejecting(owner.addr(false));
            }
        }

        VaultSystem {
            host,
            ledger,
            reentries,
            owners: state.owners.clone(),
        }
    }

    fn gen_command(
        &self,
        u: &mut Unstructured,
        state: &Self::State,
    ) -> arbitrary::Result<Self::Command> {
        let owner = u.choose_index(state.owners.len())?;
        let by_id = u.arbitrary()?;

        let cmd = if u.arbitrary::<bool>()? {
            VaultCommand::Deposit {
                owner,
                amount: u.int_in_range(0..=500)?,
                by_id,
            }
        } else {
            // Occasionally try to take more than what's there.
            let available = state.deposit_of(owner);
            VaultCommand::Withdraw {
                owner,
                amount: u.int_in_range(0..=available + 10)?,
                by_id,
                reentries: u.int_in_range(0..=3)?,
            }
        };
        Ok(cmd)
    }

    fn run_command(&self, system: &mut Self::System, cmd: &Self::Command) -> Self::Result {
        let vault = Vault::new(&system.host, &system.ledger);

        match cmd {
            VaultCommand::Deposit {
                owner,
                amount,
                by_id,
            } => {
                // The owners are not modelled as accounts, so the value comes from outside.
                system.host.credit(&VAULT, &atto(*amount));
                vault.deposit(&system.owners[*owner].addr(*by_id), &atto(*amount));
                Ok(())
            }
            VaultCommand::Withdraw {
                owner,
                amount,
                by_id,
                reentries,
            } => {
                system.reentries.set(*reentries);
                let addr = system.owners[*owner].addr(*by_id);
                let res = vault.withdraw(&addr, &atto(*amount));
                system.reentries.set(0);
                res
            }
        }
    }

    fn check_result(&self, cmd: &Self::Command, pre_state: &Self::State, result: Self::Result) {
        match cmd {
            VaultCommand::Deposit { .. } => {
                result.expect("deposits should not fail");
            }
            VaultCommand::Withdraw {
                owner,
                amount,
                by_id,
                reentries,
            } => match withdrawal(pre_state, *owner, *amount, *reentries) {
                Outcome::Paid(_) => {
                    result.expect("withdrawal should succeed");
                }
                Outcome::Overdrawn => {
                    assert!(
                        matches!(result, Err(VaultError::Overdrawn { .. })),
                        "expected overdrawn; got {result:?}"
                    );
                }
                Outcome::Rejected => {
                    let addr = pre_state.owners[*owner].addr(*by_id);
                    assert_eq!(
                        result,
                        Err(VaultError::Transfer(TransferError::RecipientRejected(
                            addr
                        )))
                    );
                }
            },
        }
    }

    fn next_state(&self, cmd: &Self::Command, mut state: Self::State) -> Self::State {
        match cmd {
            VaultCommand::Deposit { owner, amount, .. } => {
                *state.deposits.entry(*owner).or_default() += amount;
                state.balance += amount;
                state.total += amount;
            }
            VaultCommand::Withdraw {
                owner,
                amount,
                reentries,
                ..
            } => {
                if let Outcome::Paid(n) = withdrawal(&state, *owner, *amount, *reentries) {
                    let paid = n * amount;
                    *state.deposits.entry(*owner).or_default() -= paid;
                    state.balance -= paid;
                }
            }
        }
        state
    }

    fn check_system(
        &self,
        _cmd: &Self::Command,
        post_state: &Self::State,
        post_system: &Self::System,
    ) {
        let ledger = post_system.ledger.borrow();

        assert_eq!(post_system.host.balance(), atto(post_state.balance));
        assert_eq!(post_system.host.total_balance(), atto(post_state.total));
        assert_eq!(ledger.total(), atto(post_state.total_deposits()));

        for (i, owner) in post_state.owners.iter().enumerate() {
            assert_eq!(
                ledger.get(&owner.key()),
                atto(post_state.deposit_of(i)),
                "deposit of owner {i}"
            );
        }

        // Only normalized keys end up in the ledger.
        let owners = post_state.owners.iter().map(|o| o.key()).collect::<Vec<_>>();
        for (key, _) in ledger.entries() {
            assert!(owners.contains(key), "unexpected key in ledger: {key}");
        }

        // The vault can always pay everyone out.
        assert!(post_system.host.balance() >= ledger.total());
    }
}

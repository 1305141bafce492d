// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! State Machine Testing.
//!
//! A model of the system is driven by randomly generated commands alongside the
//! system itself, and after every step the results and the state of the two are compared.

use arbitrary::{Result, Unstructured};

/// Description of a state machine test: how to generate commands, how to run them
/// against the system under test, and what the idealised model expects.
pub trait StateMachine {
    /// The real thing.
    type System;
    /// The idealised reference model.
    type State: Clone;
    /// Random operation to apply on the system and the model.
    type Command;
    /// Outcome of running a command on the system.
    type Result;

    /// Generate a random initial state.
    fn gen_state(&self, u: &mut Unstructured) -> Result<Self::State>;

    /// Create a new system in a state matching the model.
    fn new_system(&self, state: &Self::State) -> Self::System;

    /// Generate a command which is applicable in the current state.
    fn gen_command(&self, u: &mut Unstructured, state: &Self::State) -> Result<Self::Command>;

    /// Apply the command on the system.
    fn run_command(&self, system: &mut Self::System, cmd: &Self::Command) -> Self::Result;

    /// Check that the result matches what the model expects. Panics if it doesn't.
    fn check_result(&self, cmd: &Self::Command, pre_state: &Self::State, result: Self::Result);

    /// Apply the command on the model.
    fn next_state(&self, cmd: &Self::Command, state: Self::State) -> Self::State;

    /// Check that the system and the model agree after the command. Panics if they don't.
    fn check_system(
        &self,
        cmd: &Self::Command,
        post_state: &Self::State,
        post_system: &Self::System,
    );
}

/// Run a state machine test for a maximum number of steps or until the random input runs out.
pub fn run<T: StateMachine>(u: &mut Unstructured, t: &T, max_steps: usize) -> Result<()> {
    let mut state = t.gen_state(u)?;
    let mut system = t.new_system(&state);
    let mut step = 0;

    while step < max_steps && !u.is_empty() {
        let cmd = t.gen_command(u, &state)?;
        let res = t.run_command(&mut system, &cmd);
        t.check_result(&cmd, &state, res);
        state = t.next_state(&cmd, state);
        t.check_system(&cmd, &state, &system);
        step += 1;
    }

    Ok(())
}

/// Define a `#[test]` running a [`StateMachine`] with `arbtest` for a time budget.
///
/// ```text
/// state_machine_test!(transfers, 10000 ms, 50 steps, TransferMachine::default());
/// ```
#[macro_export]
macro_rules! state_machine_test {
    ($name:ident, $ms:literal ms, $steps:literal steps, $smt:expr) => {
        #[test]
        fn $name() {
            let machine = $smt;
            ::arbtest::builder()
                .budget_ms($ms)
                .run(|u| $crate::smt::run(u, &machine, $steps))
        }
    };
    ($name:ident, $steps:literal steps, $smt:expr) => {
        $crate::state_machine_test!($name, 5000 ms, $steps steps, $smt);
    };
}

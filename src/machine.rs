//! This module defines the `TuringMachine` struct, which simulates a deterministic
//! single-tape Turing Machine over a shared [`Automaton`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::automaton::Automaton;
use crate::tape::Tape;
use crate::types::{State, StateId, Status, Transition};

/// A deterministic Turing Machine.
///
/// The machine owns its tape and only references the automaton, so any number of
/// machines can run the same program side by side.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    automaton: Arc<Automaton>,
    initial_tape: Tape,
    tape: Tape,
    state: StateId,
    step_count: usize,
}

impl TuringMachine {
    /// Creates a new machine on `tape`, starting in the automaton's initial state.
    pub fn new(automaton: Arc<Automaton>, tape: Tape) -> Self {
        Self {
            state: automaton.initial_state(),
            initial_tape: tape.clone(),
            tape,
            automaton,
            step_count: 0,
        }
    }

    /// Executes a single step of the machine's computation.
    ///
    /// # Returns
    ///
    /// * `Status::Accepted` if the current state is an accept state. Nothing is changed.
    /// * `Status::Halted` if no transition applies to the current state and symbol.
    /// * `Status::Running` after applying the first matching transition.
    pub fn step(&mut self) -> Status {
        if self.automaton.is_accept(self.state) {
            return Status::Accepted;
        }

        let Some(transition) = self.automaton.first_match(self.state, self.tape.read()) else {
            return Status::Halted;
        };

        self.state = transition.apply(&mut self.tape);
        self.step_count += 1;

        trace!(
            step = self.step_count,
            state = %self.automaton.state(self.state).name,
            head = self.tape.head(),
            "applied transition"
        );

        Status::Running
    }

    /// Runs the machine until it accepts or halts.
    ///
    /// There is no step limit: a machine that never reaches either loops forever.
    pub fn run(&mut self) -> Status {
        loop {
            let status = self.step();
            if status.is_terminal() {
                return status;
            }
        }
    }

    /// Runs the machine like [`run`](Self::run), checking `stop` before every step.
    ///
    /// Returns `None` if the machine was stopped before reaching a terminal status.
    pub fn run_until(&mut self, stop: &AtomicBool) -> Option<Status> {
        while !stop.load(Ordering::Acquire) {
            let status = self.step();
            if status.is_terminal() {
                return Some(status);
            }
        }

        None
    }

    /// Resets the machine to its initial tape and state.
    pub fn reset(&mut self) {
        self.state = self.automaton.initial_state();
        self.tape = self.initial_tape.clone();
        self.step_count = 0;
    }

    /// Returns the current state of the machine.
    pub fn state(&self) -> &State {
        self.automaton.state(self.state)
    }

    pub fn state_id(&self) -> StateId {
        self.state
    }

    pub fn state_name(&self) -> &str {
        &self.state().name
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Returns the number of transitions applied so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn automaton(&self) -> &Arc<Automaton> {
        &self.automaton
    }

    /// The transition the next step would apply, if any.
    pub fn transition(&self) -> Option<&Transition> {
        self.automaton.first_match(self.state, self.tape.read())
    }

    /// Whether the machine can make no further progress.
    pub fn is_halted(&self) -> bool {
        self.automaton.is_accept(self.state) || self.transition().is_none()
    }
}

//! Non-deterministic simulation.
//!
//! A [`NonDeterministicMachine`] keeps a flat, append-only list of machine instances and
//! visits them round-robin, one step per visit. When an instance faces `k` applicable
//! transitions it follows the first one itself and forks `k - 1` new instances, each on a
//! deep copy of its pre-move tape, for the others. The simulation ends as soon as any
//! instance sits in an accept state, or once every instance has halted.

use std::sync::Arc;

use tracing::debug;

use crate::automaton::Automaton;
use crate::tape::Tape;
use crate::types::{Outcome, Program, StateId, Status, Transition, ValidationError};

/// One branch of the non-deterministic computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    tape: Tape,
    state: StateId,
    status: Status,
    steps: usize,
}

impl Instance {
    fn new(tape: Tape, state: StateId) -> Self {
        Self {
            tape,
            state,
            status: Status::Running,
            steps: 0,
        }
    }

    fn advance(&mut self, transition: &Transition) {
        self.state = transition.apply(&mut self.tape);
        self.steps += 1;
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Transitions applied along this branch, including those inherited from its parent.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// How many transitions applied to a visited instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// No transition applies; the instance halts.
    None,
    /// Exactly one transition applies.
    Single,
    /// Several transitions apply; the instance forks.
    Multiple(usize),
}

/// What happened during one visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    /// Index of the visited instance.
    pub instance: usize,
    pub choice: Choice,
    /// Status of the visited instance after the visit.
    pub status: Status,
    /// Number of instances created by this visit.
    pub forks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NdtmStep {
    Visited(Visit),
    Done(Outcome),
}

/// A non-deterministic Turing Machine explored breadth-wise by round-robin forking.
#[derive(Debug, Clone)]
pub struct NonDeterministicMachine {
    automaton: Arc<Automaton>,
    instances: Vec<Instance>,
    cursor: usize,
    live: usize,
    outcome: Option<Outcome>,
}

impl NonDeterministicMachine {
    /// Creates a simulation with a single instance on `tape` in the initial state.
    pub fn new(automaton: Arc<Automaton>, tape: Tape) -> Self {
        let root = Instance::new(tape, automaton.initial_state());

        Self {
            automaton,
            instances: vec![root],
            cursor: 0,
            live: 1,
            outcome: None,
        }
    }

    /// Creates a simulation from a single-tape program.
    ///
    /// # Returns
    ///
    /// * `Err(ValidationError::MultipleNdtmTapes)` if the program defines more than one tape.
    pub fn from_program(program: &Program) -> Result<Self, ValidationError> {
        let [definition] = program.tapes.as_slice() else {
            return Err(ValidationError::MultipleNdtmTapes(program.tapes.len()));
        };

        Ok(Self::new(Arc::clone(&program.automaton), definition.tape()?))
    }

    /// Visits the next instance that has not halted.
    pub fn step(&mut self) -> NdtmStep {
        if let Some(outcome) = self.outcome {
            return NdtmStep::Done(outcome);
        }

        if self.live == 0 {
            debug!(instances = self.instances.len(), "every instance halted");
            return self.finish(Outcome::Rejected);
        }

        while self.instances[self.cursor].status == Status::Halted {
            self.advance_cursor();
        }

        let index = self.cursor;
        let automaton = &self.automaton;
        let instance = &mut self.instances[index];

        if automaton.is_accept(instance.state) {
            instance.status = Status::Accepted;
            debug!(instance = index, steps = instance.steps, "instance accepted");
            return self.finish(Outcome::Accepted { instance: index });
        }

        let matches: Vec<&Transition> = automaton
            .matching(instance.state, instance.tape.read())
            .collect();

        let (choice, forks) = match matches.as_slice() {
            [] => {
                instance.status = Status::Halted;
                self.live -= 1;
                (Choice::None, 0)
            }
            [only] => {
                instance.advance(only);
                (Choice::Single, 0)
            }
            [first, rest @ ..] => {
                let snapshot = instance.clone();
                instance.advance(first);

                for transition in rest {
                    let mut fork = snapshot.clone();
                    fork.advance(transition);
                    self.instances.push(fork);
                }
                self.live += rest.len();

                debug!(
                    instance = index,
                    forks = rest.len(),
                    total = self.instances.len(),
                    "forked instance"
                );
                (Choice::Multiple(matches.len()), rest.len())
            }
        };

        let status = self.instances[index].status;
        self.advance_cursor();

        NdtmStep::Visited(Visit {
            instance: index,
            choice,
            status,
            forks,
        })
    }

    /// Runs until some instance accepts or every instance halts.
    pub fn run(&mut self) -> Outcome {
        self.run_with(|_, _| {})
    }

    /// Runs like [`run`](Self::run), calling `observe` after every visit.
    pub fn run_with<F>(&mut self, mut observe: F) -> Outcome
    where
        F: FnMut(&Visit, &Instance),
    {
        loop {
            match self.step() {
                NdtmStep::Visited(visit) => observe(&visit, &self.instances[visit.instance]),
                NdtmStep::Done(outcome) => return outcome,
            }
        }
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    /// Number of instances that have not halted.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn automaton(&self) -> &Arc<Automaton> {
        &self.automaton
    }

    fn advance_cursor(&mut self) {
        self.cursor = (self.cursor + 1) % self.instances.len();
    }

    fn finish(&mut self, outcome: Outcome) -> NdtmStep {
        self.outcome = Some(outcome);
        NdtmStep::Done(outcome)
    }
}

//! This module builds the [`Automaton`] from a parsed [`Script`]: it discovers the states
//! referenced by the transition rows, classifies them as initial, accept or normal, and
//! resolves every row into a [`Transition`] over stable [`StateId`]s.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::parser::{Script, TransitionRow};
use crate::types::{State, StateId, StateKind, Symbol, Transition, ValidationError};

/// The validated state graph of a Turing Machine.
///
/// States live in an arena indexed by [`StateId`]. Transitions keep the order of the
/// script, which is the order the engines search them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Automaton {
    states: Vec<State>,
    transitions: Vec<Transition>,
    initial: StateId,
}

impl Automaton {
    /// Builds an automaton from the transition rows, initial state and accept states of `script`.
    ///
    /// Accept states are resolved before the initial state, so a script missing both
    /// reports the missing accept state.
    ///
    /// # Returns
    ///
    /// * `Err(ValidationError::NoAcceptState)` if no accept state names a discovered state.
    /// * `Err(ValidationError::AcceptIsInitial)` if the initial state is also an accept state.
    /// * `Err(ValidationError::NoInitialState)` if the initial state names no discovered state.
    pub fn build(script: &Script) -> Result<Self, ValidationError> {
        let names = discover_states(&script.transitions);
        let ids: HashMap<&str, StateId> = names
            .iter()
            .enumerate()
            .map(|(index, &name)| (name, StateId(index)))
            .collect();

        let mut states: Vec<State> = names
            .iter()
            .map(|&name| State {
                name: name.to_string(),
                kind: StateKind::Normal,
            })
            .collect();

        for name in script.accept_states.iter().flatten() {
            if let Some(id) = ids.get(name.as_str()) {
                states[id.index()].kind = StateKind::Accept;
            }
        }

        if !states.iter().any(State::is_accept) {
            return Err(ValidationError::NoAcceptState);
        }

        let initial = script
            .initial_state
            .as_deref()
            .and_then(|name| ids.get(name).copied())
            .ok_or(ValidationError::NoInitialState)?;

        let initial_state = &mut states[initial.index()];
        if initial_state.is_accept() {
            return Err(ValidationError::AcceptIsInitial(initial_state.name.clone()));
        }
        initial_state.kind = StateKind::Initial;

        let transitions = script
            .transitions
            .iter()
            .map(|row| Transition {
                from: ids[row.from.as_str()],
                read: row.read,
                write: row.write,
                direction: row.direction,
                to: ids[row.to.as_str()],
            })
            .collect::<Vec<_>>();

        debug!(
            states = states.len(),
            transitions = transitions.len(),
            "built automaton"
        );

        Ok(Self {
            states,
            transitions,
            initial,
        })
    }

    /// All states, indexed by [`StateId`].
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// All transitions in script order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// Looks up a state by name.
    pub fn find_state(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|state| state.name == name)
            .map(StateId)
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn is_accept(&self, id: StateId) -> bool {
        self.state(id).is_accept()
    }

    pub fn accept_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.is_accept())
            .map(|(index, _)| StateId(index))
    }

    /// Every transition that can fire in `state` reading `symbol`, in script order.
    pub fn matching(&self, state: StateId, symbol: Symbol) -> impl Iterator<Item = &Transition> {
        self.transitions
            .iter()
            .filter(move |transition| transition.applies_to(state, symbol))
    }

    /// The first transition that can fire in `state` reading `symbol`.
    ///
    /// This is what a deterministic machine follows, even if the script is ambiguous.
    pub fn first_match(&self, state: StateId, symbol: Symbol) -> Option<&Transition> {
        self.matching(state, symbol).next()
    }
}

/// Collects the unique state names of `rows` in first-seen order, `from` before `to`.
fn discover_states(rows: &[TransitionRow]) -> Vec<&str> {
    let mut seen = HashSet::new();

    rows.iter()
        .flat_map(|row| [row.from.as_str(), row.to.as_str()])
        .filter(|name| seen.insert(*name))
        .collect()
}

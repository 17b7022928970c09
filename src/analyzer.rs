//! This module provides static checks over a built [`Automaton`] to surface suspicious
//! programs before execution: ambiguous transitions that make a machine non-deterministic,
//! and states the initial state can never reach.

use std::collections::{BTreeMap, HashSet, VecDeque};
use thiserror::Error;

use crate::automaton::Automaton;
use crate::types::{StateId, Symbol, ValidationError};

/// Represents the findings of analyzing an automaton.
///
/// None of these stop a program from running; they are reported as warnings, unless a
/// deterministic run asks for [`check_deterministic`].
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum AnalysisWarning {
    /// Several transitions leave `state` reading `symbol`.
    #[error("State '{state}' has {count} transitions reading {symbol:?}")]
    NonDeterministicChoice {
        state: String,
        symbol: Symbol,
        count: usize,
    },
    /// States that cannot be reached from the initial state, sorted by name.
    #[error("Unreachable states detected: {0:?}")]
    UnreachableStates(Vec<String>),
    /// No accept state can be reached from the initial state.
    #[error("No accept state is reachable from the initial state")]
    UnreachableAcceptStates,
}

/// Runs every check over `automaton`.
///
/// # Returns
///
/// All warnings in check order: ambiguous choices first (by state, then symbol), then
/// reachability findings. An empty vector means nothing suspicious was found.
pub fn analyze(automaton: &Automaton) -> Vec<AnalysisWarning> {
    [check_choices, check_unreachable_states, check_reachable_accept]
        .iter()
        .flat_map(|check| check(automaton))
        .collect()
}

/// Fails on the first ambiguous `(state, symbol)` pair.
///
/// # Returns
///
/// * `Ok(())` if at most one transition applies to every state and symbol.
/// * `Err(ValidationError::AmbiguousTransition)` otherwise.
pub fn check_deterministic(automaton: &Automaton) -> Result<(), ValidationError> {
    match check_choices(automaton).into_iter().next() {
        Some(AnalysisWarning::NonDeterministicChoice {
            state,
            symbol,
            count,
        }) => Err(ValidationError::AmbiguousTransition {
            state,
            symbol,
            count,
        }),
        _ => Ok(()),
    }
}

/// Counts the transitions of every `(from, read)` pair and reports pairs with more than one.
fn check_choices(automaton: &Automaton) -> Vec<AnalysisWarning> {
    let mut counts: BTreeMap<(StateId, Symbol), usize> = BTreeMap::new();
    for transition in automaton.transitions() {
        *counts.entry((transition.from, transition.read)).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|((state, symbol), count)| AnalysisWarning::NonDeterministicChoice {
            state: automaton.state(state).name.clone(),
            symbol,
            count,
        })
        .collect()
}

/// Checks for unreachable states with a breadth-first search from the initial state.
fn check_unreachable_states(automaton: &Automaton) -> Vec<AnalysisWarning> {
    let visited = reachable(automaton);

    let mut unreachable: Vec<String> = automaton
        .states()
        .iter()
        .enumerate()
        .filter(|(index, _)| !visited.contains(&StateId(*index)))
        .map(|(_, state)| state.name.clone())
        .collect();

    if unreachable.is_empty() {
        return Vec::new();
    }

    unreachable.sort();
    vec![AnalysisWarning::UnreachableStates(unreachable)]
}

fn check_reachable_accept(automaton: &Automaton) -> Vec<AnalysisWarning> {
    let visited = reachable(automaton);

    if automaton.accept_states().any(|id| visited.contains(&id)) {
        Vec::new()
    } else {
        vec![AnalysisWarning::UnreachableAcceptStates]
    }
}

fn reachable(automaton: &Automaton) -> HashSet<StateId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([automaton.initial_state()]);

    while let Some(state) = queue.pop_front() {
        if !visited.insert(state) {
            continue;
        }

        for transition in automaton.transitions() {
            if transition.from == state && !visited.contains(&transition.to) {
                queue.push_back(transition.to);
            }
        }
    }

    visited
}

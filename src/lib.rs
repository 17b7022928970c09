//! This crate provides the core logic for a Turing Machine simulator.
//! It parses line-oriented machine scripts, builds a validated automaton, and runs it either
//! as a batch of deterministic machines or as a single non-deterministic machine that forks
//! on every ambiguous choice.

pub mod analyzer;
pub mod automaton;
pub mod config;
pub mod lexer;
pub mod loader;
pub mod machine;
pub mod ndtm;
pub mod parser;
pub mod programs;
pub mod runner;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the static checks from the analyzer module.
pub use analyzer::{analyze, check_deterministic, AnalysisWarning};
pub use automaton::Automaton;
pub use config::Config;
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the deterministic engine.
pub use machine::TuringMachine;
/// Re-exports the non-deterministic engine.
pub use ndtm::{Choice, Instance, NdtmStep, NonDeterministicMachine, Visit};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
pub use runner::{run, MachineReport, Observer, Report, Silent};
pub use tape::Tape;
/// Re-exports various types related to Turing Machine definition and execution from the types module.
pub use types::{
    Direction, Mode, Outcome, Program, State, StateId, StateKind, Status, Symbol, SyntaxError,
    TapeDefinition, Transition, TuringMachineError, ValidationError, Verdict, BLANK_SYMBOL,
};

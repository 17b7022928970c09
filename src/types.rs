//! This module defines the core data structures shared by the parser, the automaton builder
//! and the execution engines: symbols, states, transitions, step statuses and error types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::automaton::Automaton;
use crate::parser::{Rule, Script};
use crate::tape::Tape;

/// A single tape symbol.
pub type Symbol = char;

/// The blank symbol written into freshly grown tape cells and used for empty read/write fields.
pub const BLANK_SYMBOL: Symbol = ' ';
/// Marker that starts a comment running to the end of the line.
pub const COMMENT_MARK: &str = "//";
/// A compacted command must be strictly shorter than this many bytes.
pub const MAX_LINE_LENGTH: usize = 255;

/// A validated Turing Machine script: one automaton and the tapes it runs on.
///
/// The automaton is shared read-only by every machine instance created from the program.
#[derive(Debug, Clone)]
pub struct Program {
    pub automaton: Arc<Automaton>,
    /// Tape definitions in script order. There is always at least one.
    pub tapes: Vec<TapeDefinition>,
}

/// The initial content and head position of one tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeDefinition {
    pub content: String,
    pub head: usize,
}

impl TapeDefinition {
    /// Creates a fresh tape from this definition.
    pub fn tape(&self) -> Result<Tape, ValidationError> {
        Tape::new(&self.content, self.head)
    }
}

impl Program {
    /// Builds the automaton of `script` and pairs its tapes with their heads.
    ///
    /// Automaton errors are reported first, then tape/head mismatches.
    pub fn from_script(script: Script) -> Result<Self, TuringMachineError> {
        let automaton = Automaton::build(&script)?;

        if script.heads.len() != script.tapes.len() {
            return Err(ValidationError::TapeHeadMismatch {
                tapes: script.tapes.len(),
                heads: script.heads.len(),
            }
            .into());
        }

        if script.tapes.is_empty() {
            return Err(ValidationError::NoTape.into());
        }

        let tapes = script
            .tapes
            .into_iter()
            .zip(&script.heads)
            .map(|(content, head)| TapeDefinition {
                content,
                head: head.position,
            })
            .collect();

        Ok(Self {
            automaton: Arc::new(automaton),
            tapes,
        })
    }

    /// Returns the first tape definition.
    /// This is a convenience method for single-tape programs.
    pub fn initial_tape(&self) -> Option<&TapeDefinition> {
        self.tapes.first()
    }

    /// Checks if the program defines exactly one tape.
    pub fn is_single_tape(&self) -> bool {
        self.tapes.len() == 1
    }
}

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// Maps a script move character (`<`, `>` or `-`) to a `Direction`.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '<' => Some(Direction::Left),
            '>' => Some(Direction::Right),
            '-' => Some(Direction::Stay),
            _ => None,
        }
    }

    /// The script character for this direction.
    pub fn as_symbol(self) -> char {
        match self {
            Direction::Left => '<',
            Direction::Right => '>',
            Direction::Stay => '-',
        }
    }
}

/// Stable handle of a state inside an [`Automaton`](crate::automaton::Automaton).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Classification of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateKind {
    Initial,
    Normal,
    Accept,
}

/// A named node of the automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub kind: StateKind,
}

impl State {
    pub fn is_accept(&self) -> bool {
        self.kind == StateKind::Accept
    }

    pub fn is_initial(&self) -> bool {
        self.kind == StateKind::Initial
    }
}

/// A single transition rule: `(from, read) -> (write, direction, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state this transition leaves from.
    pub from: StateId,
    /// The symbol that must be under the head.
    pub read: Symbol,
    /// The symbol written under the head.
    pub write: Symbol,
    /// Where the head moves after writing.
    pub direction: Direction,
    /// The state the machine transitions to.
    pub to: StateId,
}

impl Transition {
    /// Whether this transition can fire in `state` with `symbol` under the head.
    pub fn applies_to(&self, state: StateId, symbol: Symbol) -> bool {
        self.from == state && self.read == symbol
    }

    /// Writes, moves the head (growing the tape at its edges) and returns the next state.
    pub fn apply(&self, tape: &mut Tape) -> StateId {
        tape.write(self.write);
        tape.shift(self.direction);
        self.to
    }
}

/// The status reported for a machine after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// A transition was applied; the machine keeps going.
    Running,
    /// The machine sits in an accept state.
    Accepted,
    /// No transition applies to the current state and symbol.
    Halted,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Running)
    }
}

/// Final verdict of one machine (or NDTM instance) in a run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    Halted,
    /// Interrupted, or never started, because another machine accepted first.
    Stopped,
}

impl From<Status> for Verdict {
    fn from(status: Status) -> Self {
        match status {
            Status::Accepted => Verdict::Accepted,
            Status::Halted => Verdict::Halted,
            Status::Running => Verdict::Stopped,
        }
    }
}

/// Result of a non-deterministic simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Some instance reached an accept state.
    Accepted { instance: usize },
    /// Every instance halted without accepting.
    Rejected,
}

/// The simulation mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Every tape runs as an independent deterministic machine.
    #[default]
    Deterministic,
    /// A single tape explores every applicable transition by forking.
    NonDeterministic,
}

/// Malformed script lines. Always reported together with a line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("Command must not have more than 256 valid characters.")]
    CommandTooLong,
    #[error("Initial State must not be empty.")]
    EmptyInitialState,
    #[error("Accept States Definition must not be empty.")]
    EmptyAcceptState,
    #[error("Tape String must not be empty.")]
    EmptyTape,
    #[error("Tape Head Index invalid.")]
    InvalidHead(String),
    #[error("Tape Head Index must be lesser than Tape length. Take note that tape index is zero-based.")]
    HeadOutOfRange { head: usize, len: usize },
    #[error("Expected 4 commas separating 5 fields, found {0}.")]
    CommaCount(usize),
    #[error("Head movement must have a single character length.")]
    MoveLength(String),
    #[error("Head movement must be < (left), > (right) or - (no move).")]
    InvalidMove(char),
    #[error("Symbol must have a single character length.")]
    SymbolLength(String),
    #[error("State name must not be empty.")]
    EmptyStateName,
}

/// Semantic problems detected once the whole script has been read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No valid Accept State defined.")]
    NoAcceptState,
    #[error("Accept States cannot be Initial State.")]
    AcceptIsInitial(String),
    #[error("No valid Initial State defined.")]
    NoInitialState,
    #[error("Number of Tape Definitions and Head Definitions must match.")]
    TapeHeadMismatch { tapes: usize, heads: usize },
    #[error("No Tape Definition found.")]
    NoTape,
    #[error("You can only run a single NDTM per file.")]
    MultipleNdtmTapes(usize),
    #[error("Tape Head Index {head} is out of range for a tape of length {len}.")]
    HeadOutOfRange { head: usize, len: usize },
    #[error("State '{state}' has {count} transitions reading {symbol:?}; a deterministic machine allows one.")]
    AmbiguousTransition {
        state: String,
        symbol: Symbol,
        count: usize,
    },
    #[error("Program '{0}' not found.")]
    UnknownProgram(String),
}

/// Represents various errors that can occur during Turing Machine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// A malformed line in a script.
    #[error("Invalid Command in Line {line}. {error}")]
    Syntax { line: usize, error: SyntaxError },
    /// The script is well formed but does not describe a valid machine.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// The line grammar rejected its input.
    #[error("Program parsing error: {0}")]
    Grammar(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error related to file system operations, such as reading program files.
    #[error("File error: {0}")]
    FileError(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TuringMachineError {
    pub(crate) fn syntax(line: usize, error: SyntaxError) -> Self {
        TuringMachineError::Syntax { line, error }
    }
}

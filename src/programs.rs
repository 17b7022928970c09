//! Built-in Turing Machine scripts, embedded at compile time.
//!
//! Each script names itself with a `// name:` comment and declares the mode it is meant to
//! run in with a `// mode: dtm` or `// mode: ndtm` comment.

use crate::parser::parse;
use crate::types::{Mode, Program, TuringMachineError, ValidationError};

const PROGRAM_TEXTS: [&str; 3] = [
    include_str!("../programs/even-zeros.tm"),
    include_str!("../programs/binary-increment.tm"),
    include_str!("../programs/contains-11.tm"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: Vec<ProgramInfo> = PROGRAM_TEXTS
        .iter()
        .enumerate()
        .map(|(index, text)| ProgramInfo::from_text(index, text))
        .collect();
}

/// A built-in script together with the metadata read from its header comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub mode: Mode,
    pub text: &'static str,
}

impl ProgramInfo {
    fn from_text(index: usize, text: &'static str) -> Self {
        let name = header(text, "name")
            .map(str::to_string)
            .unwrap_or_else(|| format!("program-{}", index));
        let mode = match header(text, "mode") {
            Some("ndtm") => Mode::NonDeterministic,
            _ => Mode::Deterministic,
        };

        Self {
            index,
            name,
            mode,
            text,
        }
    }

    /// Parses the script.
    pub fn program(&self) -> Result<Program, TuringMachineError> {
        parse(self.text)
    }
}

/// The value of the first `// key: value` comment line in `text`.
fn header<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let (found, value) = line.trim().strip_prefix("//")?.split_once(':')?;
        (found.trim() == key).then(|| value.trim())
    })
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn count() -> usize {
        PROGRAMS.len()
    }

    /// List all program names
    pub fn list_names() -> Vec<String> {
        PROGRAMS.iter().map(|info| info.name.clone()).collect()
    }

    pub fn get_info(name: &str) -> Option<&'static ProgramInfo> {
        PROGRAMS.iter().find(|info| info.name == name)
    }

    /// Get a program by its name
    pub fn get_by_name(name: &str) -> Result<Program, TuringMachineError> {
        Self::get_info(name)
            .ok_or_else(|| ValidationError::UnknownProgram(name.to_string()))?
            .program()
    }

    /// Get a program by its index
    pub fn get_by_index(index: usize) -> Result<Program, TuringMachineError> {
        PROGRAMS
            .get(index)
            .ok_or_else(|| ValidationError::UnknownProgram(format!("#{}", index)))?
            .program()
    }

    /// Search for programs by name, case-insensitively
    pub fn search(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        PROGRAMS
            .iter()
            .filter(|info| info.name.to_lowercase().contains(&query))
            .map(|info| info.index)
            .collect()
    }
}

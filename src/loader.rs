//! This module provides the `ProgramLoader` struct, which reads Turing Machine scripts from
//! files, readers and strings, and discovers every script in a directory.

use crate::parser::parse;
use crate::types::{Program, TuringMachineError};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// File extension of Turing Machine scripts.
pub const SCRIPT_EXTENSION: &str = "tm";

/// `ProgramLoader` is a utility struct for loading Turing Machine programs.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single Turing Machine program from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is read and describes a valid machine.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * Any parse or validation error of the script otherwise.
    pub fn load_program(path: &Path) -> Result<Program, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        parse(&content)
    }

    /// Loads a program from string content, e.g. a built-in script or user input.
    pub fn load_program_from_string(content: &str) -> Result<Program, TuringMachineError> {
        parse(content)
    }

    /// Reads `reader` to the end and parses its content, e.g. a script piped on stdin.
    pub fn load_program_from_reader<R: Read>(mut reader: R) -> Result<Program, TuringMachineError> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| TuringMachineError::FileError(format!("Failed to read input: {}", e)))?;

        parse(&content)
    }

    /// Loads every `.tm` script in `directory`, sorted by path.
    ///
    /// Subdirectories and other files are skipped. A script that fails to load does not stop
    /// the others: each path is paired with its own result.
    ///
    /// # Returns
    ///
    /// * `Err(TuringMachineError::FileError)` if the directory itself cannot be read.
    pub fn load_programs(
        directory: &Path,
    ) -> Result<Vec<(PathBuf, Result<Program, TuringMachineError>)>, TuringMachineError> {
        let entries = fs::read_dir(directory).map_err(|e| {
            TuringMachineError::FileError(format!(
                "Failed to read directory {}: {}",
                directory.display(),
                e
            ))
        })?;

        let mut paths = entries
            .map(|entry| {
                entry.map(|entry| entry.path()).map_err(|e| {
                    TuringMachineError::FileError(format!("Failed to read directory entry: {}", e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        paths.retain(|path| {
            path.is_file()
                && path
                    .extension()
                    .map_or(false, |extension| extension == SCRIPT_EXTENSION)
        });
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| {
                let program = Self::load_program(&path);
                (path, program)
            })
            .collect())
    }
}

//! A growable single-head tape. The tape extends itself by one blank cell whenever the head
//! would run off either edge, so the head index is always in bounds.

use std::fmt;

use crate::types::{Direction, Symbol, ValidationError, BLANK_SYMBOL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    symbols: Vec<Symbol>,
    head: usize,
}

impl Tape {
    /// Creates a tape holding `content` with the head on cell `head`.
    ///
    /// Empty content yields a single blank cell.
    ///
    /// # Returns
    ///
    /// * `Err(ValidationError::HeadOutOfRange)` if `head` does not point inside the tape.
    pub fn new(content: &str, head: usize) -> Result<Self, ValidationError> {
        let mut symbols: Vec<Symbol> = content.chars().collect();
        if symbols.is_empty() {
            symbols.push(BLANK_SYMBOL);
        }

        if head >= symbols.len() {
            return Err(ValidationError::HeadOutOfRange {
                head,
                len: symbols.len(),
            });
        }

        Ok(Self { symbols, head })
    }

    /// Returns the symbol under the head.
    pub fn read(&self) -> Symbol {
        self.symbols[self.head]
    }

    /// Overwrites the symbol under the head.
    pub fn write(&mut self, symbol: Symbol) {
        self.symbols[self.head] = symbol;
    }

    /// Moves the head one cell.
    ///
    /// Moving left from cell 0 prepends a blank and leaves the head at index 0, on the new
    /// cell. Moving right from the last cell appends a blank before advancing.
    pub fn shift(&mut self, direction: Direction) {
        match direction {
            Direction::Left => {
                if self.head == 0 {
                    self.symbols.insert(0, BLANK_SYMBOL);
                } else {
                    self.head -= 1;
                }
            }
            Direction::Right => {
                if self.head == self.symbols.len() - 1 {
                    self.symbols.push(BLANK_SYMBOL);
                }
                self.head += 1;
            }
            Direction::Stay => {}
        }
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false: a tape holds at least one cell.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbols.iter().try_for_each(|symbol| write!(f, "{symbol}"))
    }
}

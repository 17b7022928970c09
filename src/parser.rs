//! This module provides the parser for Turing Machine scripts, utilizing the `pest` crate.
//!
//! Scripts are line oriented. Every line is first normalized by the lexer, then classified
//! by the grammar in `grammar.pest` as one of the four directives (`initial_state=`,
//! `accept_states=`, `tape=`, `head=`) or as a transition row. The result is a [`Script`],
//! the raw intermediate representation that the automaton builder turns into a [`Program`].

use crate::{
    lexer::normalize,
    types::{
        Direction, Program, Symbol, SyntaxError, TuringMachineError, BLANK_SYMBOL,
        MAX_LINE_LENGTH,
    },
};
use pest::{iterators::Pair, Parser as PestParser};
use pest_derive::Parser as PestParser;
use tracing::{trace, warn};

/// Derives a `PestParser` for the line grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct ScriptParser;

/// A `head=` directive together with the line it was declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadDefinition {
    pub position: usize,
    pub line: usize,
}

/// A raw transition row, with state names still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRow {
    pub line: usize,
    pub from: String,
    pub read: Symbol,
    pub write: Symbol,
    pub direction: Direction,
    pub to: String,
}

/// Everything collected from a script before the automaton is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    /// Tape contents, in definition order.
    pub tapes: Vec<String>,
    /// Head positions, matched with `tapes` by definition order.
    pub heads: Vec<HeadDefinition>,
    pub initial_state: Option<String>,
    pub accept_states: Option<Vec<String>>,
    pub transitions: Vec<TransitionRow>,
}

/// Parses and validates a script into a runnable [`Program`].
///
/// # Returns
///
/// * `Ok(Program)` if the script is well formed and describes a valid automaton.
/// * `Err(TuringMachineError::Syntax)` for the first malformed line.
/// * `Err(TuringMachineError::Validation)` if the automaton or its tapes are invalid.
pub fn parse(input: &str) -> Result<Program, TuringMachineError> {
    let script = parse_script(input)?;

    Program::from_script(script)
}

/// Parses a script into its intermediate [`Script`] form without building the automaton.
///
/// Parsing stops at the first malformed line. Redefinitions of `initial_state=` and
/// `accept_states=` are logged and replace the earlier definition.
pub fn parse_script(input: &str) -> Result<Script, TuringMachineError> {
    let mut script = Script::default();

    for (index, raw) in input.lines().enumerate() {
        let line_number = index + 1;
        let line = normalize(raw);

        if line.is_blank() {
            continue;
        }

        if line.compact.len() >= MAX_LINE_LENGTH {
            return Err(TuringMachineError::syntax(
                line_number,
                SyntaxError::CommandTooLong,
            ));
        }

        let pairs = ScriptParser::parse(Rule::line, &line.compact)
            .map_err(|e| TuringMachineError::Grammar(Box::new(e)))?;

        for pair in pairs {
            match pair.as_rule() {
                Rule::initial_state => {
                    parse_initial_state(inner_str(pair), line_number, &mut script)?
                }
                Rule::accept_states => {
                    parse_accept_states(inner_str(pair), line_number, &mut script)?
                }
                Rule::tape => {
                    if inner_str(pair).is_empty() {
                        return Err(TuringMachineError::syntax(
                            line_number,
                            SyntaxError::EmptyTape,
                        ));
                    }
                    // The tape keeps its inner spaces, so it is read from the raw text.
                    script.tapes.push(line.raw_value());
                }
                Rule::head => parse_head(inner_str(pair), line_number, &mut script)?,
                Rule::transition => {
                    let row = parse_transition(pair, line_number)?;
                    trace!(line = line_number, ?row, "parsed transition");
                    script.transitions.push(row);
                }
                _ => {} // EOI
            }
        }
    }

    // Heads declared before their tape are range checked once every tape is known.
    for (head, tape) in script.heads.iter().zip(&script.tapes) {
        check_head_range(head, tape)?;
    }

    Ok(script)
}

fn parse_initial_state(
    name: &str,
    line: usize,
    script: &mut Script,
) -> Result<(), TuringMachineError> {
    if name.is_empty() {
        return Err(TuringMachineError::syntax(
            line,
            SyntaxError::EmptyInitialState,
        ));
    }

    if script.initial_state.is_some() {
        warn!("Initial State in Line {line} redefinition.");
    }

    script.initial_state = Some(name.to_string());
    Ok(())
}

fn parse_accept_states(
    value: &str,
    line: usize,
    script: &mut Script,
) -> Result<(), TuringMachineError> {
    let names: Vec<String> = value.split(',').map(str::to_string).collect();

    if names.iter().any(String::is_empty) {
        return Err(TuringMachineError::syntax(
            line,
            SyntaxError::EmptyAcceptState,
        ));
    }

    if script.accept_states.is_some() {
        warn!("Accept States in Line {line} redefinition.");
    }

    script.accept_states = Some(names);
    Ok(())
}

fn parse_head(value: &str, line: usize, script: &mut Script) -> Result<(), TuringMachineError> {
    let position = value.parse::<usize>().map_err(|_| {
        TuringMachineError::syntax(line, SyntaxError::InvalidHead(value.to_string()))
    })?;
    let head = HeadDefinition { position, line };

    if let Some(tape) = script.tapes.get(script.heads.len()) {
        check_head_range(&head, tape)?;
    }

    script.heads.push(head);
    Ok(())
}

/// Parses a `from,read,write,move,to` row.
fn parse_transition(
    pair: Pair<'_, Rule>,
    line: usize,
) -> Result<TransitionRow, TuringMachineError> {
    let fields: Vec<&str> = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::field)
        .map(|p| p.as_str())
        .collect();

    let &[from, read, write, movement, to] = fields.as_slice() else {
        return Err(TuringMachineError::syntax(
            line,
            SyntaxError::CommaCount(fields.len().saturating_sub(1)),
        ));
    };

    let direction = parse_direction(movement, line)?;

    if from.is_empty() || to.is_empty() {
        return Err(TuringMachineError::syntax(line, SyntaxError::EmptyStateName));
    }

    Ok(TransitionRow {
        line,
        from: from.to_string(),
        read: parse_symbol(read, line)?,
        write: parse_symbol(write, line)?,
        direction,
        to: to.to_string(),
    })
}

/// Parses the move field, which must be exactly one of `<`, `>` or `-`.
fn parse_direction(field: &str, line: usize) -> Result<Direction, TuringMachineError> {
    let mut chars = field.chars();
    let (Some(symbol), None) = (chars.next(), chars.next()) else {
        return Err(TuringMachineError::syntax(
            line,
            SyntaxError::MoveLength(field.to_string()),
        ));
    };

    Direction::from_symbol(symbol)
        .ok_or_else(|| TuringMachineError::syntax(line, SyntaxError::InvalidMove(symbol)))
}

/// Parses a read or write field. An empty field stands for the blank symbol.
fn parse_symbol(field: &str, line: usize) -> Result<Symbol, TuringMachineError> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(BLANK_SYMBOL),
        (Some(symbol), None) => Ok(symbol),
        _ => Err(TuringMachineError::syntax(
            line,
            SyntaxError::SymbolLength(field.to_string()),
        )),
    }
}

fn check_head_range(head: &HeadDefinition, tape: &str) -> Result<(), TuringMachineError> {
    let len = tape.chars().count();
    if head.position >= len {
        return Err(TuringMachineError::syntax(
            head.line,
            SyntaxError::HeadOutOfRange {
                head: head.position,
                len,
            },
        ));
    }

    Ok(())
}

/// Extracts the `value` of a directive pair.
fn inner_str(pair: Pair<'_, Rule>) -> &str {
    pair.into_inner()
        .next()
        .map(|value| value.as_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationError;

    const ONE_STEP_ACCEPT: &str = r#"
tape=1
head=0
initial_state=S0
accept_states=ACC
S0,1,1,-,ACC
"#;

    fn syntax_error(input: &str) -> (usize, SyntaxError) {
        match parse_script(input) {
            Err(TuringMachineError::Syntax { line, error }) => (line, error),
            other => panic!("Expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_script() {
        let script = parse_script(ONE_STEP_ACCEPT).unwrap();

        assert_eq!(script.tapes, vec!["1"]);
        assert_eq!(script.heads, vec![HeadDefinition { position: 0, line: 3 }]);
        assert_eq!(script.initial_state.as_deref(), Some("S0"));
        assert_eq!(script.accept_states, Some(vec!["ACC".to_string()]));
        assert_eq!(
            script.transitions,
            vec![TransitionRow {
                line: 6,
                from: "S0".into(),
                read: '1',
                write: '1',
                direction: Direction::Stay,
                to: "ACC".into(),
            }]
        );
    }

    #[test]
    fn test_parse_builds_program() {
        let program = parse(ONE_STEP_ACCEPT).unwrap();
        assert_eq!(program.automaton.states().len(), 2);
        assert_eq!(program.tapes.len(), 1);
        assert_eq!(program.tapes[0].content, "1");
    }

    #[test]
    fn test_comments_and_whitespace_are_ignored() {
        let input = "
// a machine
  initial_state = q0   // start here
accept_states = done

q0 , a , b , > , done
";
        let script = parse_script(input).unwrap();
        assert_eq!(script.initial_state.as_deref(), Some("q0"));
        assert_eq!(script.transitions[0].from, "q0");
        assert_eq!(script.transitions[0].read, 'a');
        assert_eq!(script.transitions[0].write, 'b');
        assert_eq!(script.transitions[0].line, 6);
    }

    #[test]
    fn test_empty_symbols_default_to_blank() {
        let script = parse_script("q0,,,<,q1").unwrap();
        let row = &script.transitions[0];

        assert_eq!(row.read, BLANK_SYMBOL);
        assert_eq!(row.write, BLANK_SYMBOL);
        assert_eq!(row.direction, Direction::Left);
    }

    #[test]
    fn test_multiple_accept_states() {
        let script = parse_script("accept_states=a,b,c").unwrap();
        assert_eq!(
            script.accept_states,
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_empty_accept_state_segment() {
        assert_eq!(
            syntax_error("accept_states=a,,b"),
            (1, SyntaxError::EmptyAcceptState)
        );
        assert_eq!(
            syntax_error("accept_states=a,"),
            (1, SyntaxError::EmptyAcceptState)
        );
        assert_eq!(
            syntax_error("accept_states="),
            (1, SyntaxError::EmptyAcceptState)
        );
    }

    #[test]
    fn test_redefinitions_replace_previous_values() {
        let input = "
initial_state=first
initial_state=second
accept_states=a,b
accept_states=c
";
        let script = parse_script(input).unwrap();
        assert_eq!(script.initial_state.as_deref(), Some("second"));
        assert_eq!(script.accept_states, Some(vec!["c".to_string()]));
    }

    #[test]
    fn test_empty_initial_state() {
        assert_eq!(
            syntax_error("\ninitial_state=  "),
            (2, SyntaxError::EmptyInitialState)
        );
    }

    #[test]
    fn test_multiple_tapes_keep_inner_spaces() {
        let input = "
tape=1 0 1
head=2
tape=abc
head=0
";
        let script = parse_script(input).unwrap();
        assert_eq!(script.tapes, vec!["1 0 1", "abc"]);
        assert_eq!(script.heads[0].position, 2);
        assert_eq!(script.heads[1].position, 0);
    }

    #[test]
    fn test_tab_inside_tape_is_blank() {
        let script = parse_script("tape=1\t0\nhead=1\n").unwrap();
        assert_eq!(script.tapes, vec!["1 0"]);

        let program = parse(
            "
tape=1	0
head=1
initial_state=S0
accept_states=ACC
S0,,,-,ACC
",
        )
        .unwrap();
        let tape = program.tapes[0].tape().unwrap();
        assert_eq!(tape.read(), BLANK_SYMBOL);
    }

    #[test]
    fn test_empty_tape() {
        assert_eq!(syntax_error("tape=   // nothing"), (1, SyntaxError::EmptyTape));
    }

    #[test]
    fn test_invalid_head() {
        assert_eq!(
            syntax_error("tape=1\nhead=x"),
            (2, SyntaxError::InvalidHead("x".into()))
        );
        assert_eq!(
            syntax_error("tape=1\nhead="),
            (2, SyntaxError::InvalidHead(String::new()))
        );
    }

    #[test]
    fn test_head_out_of_range() {
        let (line, error) = syntax_error("tape=101\nhead=3");
        assert_eq!(line, 2);
        assert_eq!(error, SyntaxError::HeadOutOfRange { head: 3, len: 3 });
        assert!(error.to_string().contains("zero-based"));
    }

    #[test]
    fn test_head_before_tape_is_checked_at_end() {
        let input = "head=5\ntape=ab";
        assert_eq!(
            syntax_error(input),
            (1, SyntaxError::HeadOutOfRange { head: 5, len: 2 })
        );

        assert!(parse_script("head=1\ntape=ab").is_ok());
    }

    #[test]
    fn test_wrong_comma_count() {
        let input = "\n\nq0,1,1,q1";
        let result = parse(input);
        let error = result.unwrap_err();

        assert_eq!(
            error,
            TuringMachineError::Syntax {
                line: 3,
                error: SyntaxError::CommaCount(3)
            }
        );
        assert!(error.to_string().starts_with("Invalid Command in Line 3."));

        assert_eq!(
            syntax_error("q0,1,1,>,q1,extra"),
            (1, SyntaxError::CommaCount(5))
        );
        assert_eq!(syntax_error("garbage"), (1, SyntaxError::CommaCount(0)));
    }

    #[test]
    fn test_move_field_length() {
        assert_eq!(
            syntax_error("q0,1,1,>>,q1"),
            (1, SyntaxError::MoveLength(">>".into()))
        );
        assert_eq!(
            syntax_error("q0,1,1,,q1"),
            (1, SyntaxError::MoveLength(String::new()))
        );
    }

    #[test]
    fn test_invalid_move_character() {
        assert_eq!(syntax_error("q0,1,1,R,q1"), (1, SyntaxError::InvalidMove('R')));
    }

    #[test]
    fn test_symbol_length() {
        assert_eq!(
            syntax_error("q0,10,1,>,q1"),
            (1, SyntaxError::SymbolLength("10".into()))
        );
    }

    #[test]
    fn test_empty_state_names() {
        assert_eq!(syntax_error(",1,1,>,q1"), (1, SyntaxError::EmptyStateName));
        assert_eq!(syntax_error("q0,1,1,>,"), (1, SyntaxError::EmptyStateName));
    }

    #[test]
    fn test_command_too_long() {
        let long_name = "q".repeat(MAX_LINE_LENGTH);
        let input = format!("tape=1\n{long_name},1,1,>,q1");
        assert_eq!(syntax_error(&input), (2, SyntaxError::CommandTooLong));

        // Whitespace does not count towards the limit.
        let spaced = format!("q0,1,1,>,q1{}", " ".repeat(MAX_LINE_LENGTH));
        assert!(parse_script(&spaced).is_ok());
    }

    #[test]
    fn test_first_error_aborts() {
        let input = "q0,1,1,X,q1\nq0,1,1,>";
        assert_eq!(syntax_error(input), (1, SyntaxError::InvalidMove('X')));
    }

    #[test]
    fn test_directive_prefix_wins_over_transition() {
        // A line starting with a directive prefix is never a transition row.
        let script = parse_script("initial_state=a,b,c,d,e").unwrap();
        assert_eq!(script.initial_state.as_deref(), Some("a,b,c,d,e"));
        assert!(script.transitions.is_empty());
    }

    #[test]
    fn test_parse_reports_validation_errors() {
        let input = "
tape=1
head=0
initial_state=S0
accept_states=NOWHERE
S0,1,1,-,S1
";
        assert_eq!(
            parse(input).unwrap_err(),
            TuringMachineError::Validation(ValidationError::NoAcceptState)
        );
    }

    #[test]
    fn test_more_tapes_than_heads() {
        let input = "
tape=1
tape=0
head=0
initial_state=S0
accept_states=ACC
S0,1,1,-,ACC
";
        let error = parse(input).unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::Validation(ValidationError::TapeHeadMismatch { tapes: 2, heads: 1 })
        );
        assert_eq!(
            error.to_string(),
            "Number of Tape Definitions and Head Definitions must match."
        );
    }

    #[test]
    fn test_more_heads_than_tapes() {
        let input = "
tape=1
head=0
head=0
initial_state=S0
accept_states=ACC
S0,1,1,-,ACC
";
        assert_eq!(
            parse(input).unwrap_err(),
            TuringMachineError::Validation(ValidationError::TapeHeadMismatch { tapes: 1, heads: 2 })
        );
    }

    #[test]
    fn test_missing_tape() {
        let input = "
initial_state=S0
accept_states=ACC
S0,1,1,-,ACC
";
        let error = parse(input).unwrap_err();
        assert_eq!(error, TuringMachineError::Validation(ValidationError::NoTape));
        assert_eq!(error.to_string(), "No Tape Definition found.");
    }
}

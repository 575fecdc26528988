//! Edit scripts: line-oriented sequences of buffer operations.
//!
//! One command per line; blank lines and lines starting with `#` are
//! skipped. Arguments are whitespace separated, except for `type`, which
//! takes the rest of the line after a single separating space.
//!
//! ```text
//! # build two rows, then go back up
//! type hello
//! insert \n
//! type world
//! up
//! column 2
//! remove
//! ```
//!
//! Characters in `insert` and `type` arguments accept the escapes `\n`,
//! `\r`, `\t`, `\s` (space), `\\` and `\u{XXXX}` (hex code point).
//! Scripts written through `Display` escape every whitespace character
//! other than a space inside `type` text, so they always parse back.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::TextBuffer;

/// Errors produced while reading a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: `{command}` needs an argument")]
    MissingArgument { line: usize, command: &'static str },

    #[error("line {line}: `{command}` takes no argument but got `{found}`")]
    UnexpectedArgument {
        line: usize,
        command: &'static str,
        found: String,
    },

    #[error("line {line}: invalid column `{value}`")]
    InvalidColumn {
        line: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("line {line}: expected a single character but got `{value}`")]
    InvalidCharacter { line: usize, value: String },

    #[error("line {line}: unknown escape `\\{escape}`")]
    UnknownEscape { line: usize, escape: char },

    #[error("line {line}: invalid unicode escape `\\u{value}`")]
    InvalidUnicodeEscape { line: usize, value: String },

    #[error("invalid JSON script")]
    Json(#[from] serde_json::Error),
}

/// A single buffer operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "arg", rename_all = "snake_case")]
pub enum Edit {
    Forward,
    Backward,
    Up,
    Down,
    RowStart,
    RowEnd,
    Column(usize),
    Insert(char),
    Type(String),
    Remove,
}

impl Edit {
    /// Run this edit against `buffer`.
    ///
    /// Returns whether the buffer acted: the result of `forward`, `backward`,
    /// `up`, `down` and `remove`, and `true` for operations that cannot fail.
    pub fn apply(&self, buffer: &mut TextBuffer) -> bool {
        match self {
            Self::Forward => buffer.forward(),
            Self::Backward => buffer.backward(),
            Self::Up => buffer.up(),
            Self::Down => buffer.down(),
            Self::RowStart => {
                buffer.move_to_row_start();
                true
            }
            Self::RowEnd => {
                buffer.move_to_row_end();
                true
            }
            Self::Column(target) => {
                buffer.move_to_column(*target);
                true
            }
            Self::Insert(c) => {
                buffer.insert(*c);
                true
            }
            Self::Type(text) => {
                buffer.insert_str(text);
                true
            }
            Self::Remove => buffer.remove(),
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Backward => f.write_str("backward"),
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
            Self::RowStart => f.write_str("home"),
            Self::RowEnd => f.write_str("end"),
            Self::Column(target) => write!(f, "column {target}"),
            Self::Insert(c) => write!(f, "insert {}", escape_char(*c, true)),
            Self::Type(text) => {
                f.write_str("type ")?;
                text.chars()
                    .try_for_each(|c| f.write_str(&escape_char(c, false)))
            }
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// An ordered list of edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    edits: Vec<Edit>,
}

impl Script {
    pub const fn new() -> Self {
        Self { edits: Vec::new() }
    }

    /// Parse the line-oriented script format.
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut edits = Vec::new();
        for (i, raw) in source.lines().enumerate() {
            if let Some(edit) = parse_line(i + 1, raw)? {
                edits.push(edit);
            }
        }
        debug!(edits = edits.len(), "parsed edit script");
        Ok(Self { edits })
    }

    /// Read a script stored as a JSON array of edits.
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ScriptError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    pub const fn len(&self) -> usize {
        self.edits.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every edit in order and return how many of them acted.
    pub fn replay(&self, buffer: &mut TextBuffer) -> usize {
        let acted = self.edits.iter().filter(|edit| edit.apply(buffer)).count();
        debug!(
            edits = self.edits.len(),
            acted,
            row = buffer.row(),
            column = buffer.column(),
            index = buffer.index(),
            "replayed edit script"
        );
        acted
    }
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromIterator<Edit> for Script {
    fn from_iter<I: IntoIterator<Item = Edit>>(iter: I) -> Self {
        Self {
            edits: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for edit in &self.edits {
            writeln!(f, "{edit}")?;
        }
        Ok(())
    }
}

fn parse_line(line: usize, raw: &str) -> Result<Option<Edit>, ScriptError> {
    let trimmed = raw.trim_start();
    if trimmed.trim_end().is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let command = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default();
    let rest = &trimmed[command.len()..];

    let edit = match command {
        "forward" => no_argument(line, "forward", rest, Edit::Forward)?,
        "backward" => no_argument(line, "backward", rest, Edit::Backward)?,
        "up" => no_argument(line, "up", rest, Edit::Up)?,
        "down" => no_argument(line, "down", rest, Edit::Down)?,
        "home" => no_argument(line, "home", rest, Edit::RowStart)?,
        "end" => no_argument(line, "end", rest, Edit::RowEnd)?,
        "remove" => no_argument(line, "remove", rest, Edit::Remove)?,
        "column" => {
            let value = single_argument(line, "column", rest)?;
            let target = value.parse().map_err(|source| ScriptError::InvalidColumn {
                line,
                value: value.to_string(),
                source,
            })?;
            Edit::Column(target)
        }
        "insert" => {
            let value = single_argument(line, "insert", rest)?;
            let unescaped = unescape(line, value)?;
            let mut chars = unescaped.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Edit::Insert(c),
                _ => {
                    return Err(ScriptError::InvalidCharacter {
                        line,
                        value: value.to_string(),
                    });
                }
            }
        }
        "type" => {
            let text = rest
                .strip_prefix(' ')
                .or_else(|| rest.strip_prefix('\t'))
                .ok_or(ScriptError::MissingArgument {
                    line,
                    command: "type",
                })?;
            Edit::Type(unescape(line, text)?)
        }
        other => {
            return Err(ScriptError::UnknownCommand {
                line,
                command: other.to_string(),
            });
        }
    };
    Ok(Some(edit))
}

fn no_argument(
    line: usize,
    command: &'static str,
    rest: &str,
    edit: Edit,
) -> Result<Edit, ScriptError> {
    let found = rest.trim();
    if found.is_empty() {
        Ok(edit)
    } else {
        Err(ScriptError::UnexpectedArgument {
            line,
            command,
            found: found.to_string(),
        })
    }
}

fn single_argument<'a>(
    line: usize,
    command: &'static str,
    rest: &'a str,
) -> Result<&'a str, ScriptError> {
    let mut args = rest.split_whitespace();
    match (args.next(), args.next()) {
        (Some(value), None) => Ok(value),
        (None, _) => Err(ScriptError::MissingArgument { line, command }),
        (Some(_), Some(_)) => Err(ScriptError::UnexpectedArgument {
            line,
            command,
            found: rest.trim().to_string(),
        }),
    }
}

fn unescape(line: usize, s: &str) -> Result<String, ScriptError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => out.push(unescape_code_point(line, &mut chars)?),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some(escape) => return Err(ScriptError::UnknownEscape { line, escape }),
            // A trailing lone backslash is taken literally.
            None => out.push('\\'),
        }
    }
    Ok(out)
}

/// Read the `{XXXX}` part of a `\u{XXXX}` escape.
fn unescape_code_point(line: usize, chars: &mut std::str::Chars<'_>) -> Result<char, ScriptError> {
    let mut value = String::new();
    if chars.next() != Some('{') {
        return Err(ScriptError::InvalidUnicodeEscape { line, value });
    }
    for c in chars.by_ref() {
        if c == '}' {
            return u32::from_str_radix(&value, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| ScriptError::InvalidUnicodeEscape {
                    line,
                    value: format!("{{{value}}}"),
                });
        }
        value.push(c);
    }
    Err(ScriptError::InvalidUnicodeEscape {
        line,
        value: format!("{{{value}"),
    })
}

/// `insert` arguments are split on whitespace, so every whitespace
/// character is escaped there; `type` text keeps plain spaces.
fn escape_char(c: char, escape_space: bool) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        '\\' => "\\\\".to_string(),
        ' ' if escape_space => "\\s".to_string(),
        ' ' => " ".to_string(),
        c if c.is_whitespace() => format!("\\u{{{:x}}}", u32::from(c)),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let script = Script::parse("# comment\n\nforward\n   \n  # indented comment\nup\n").unwrap();
        assert_eq!(script.edits(), &[Edit::Forward, Edit::Up]);
    }

    #[test]
    fn test_parse_every_command() {
        let source = "forward\nbackward\nup\ndown\nhome\nend\ncolumn 4\ninsert x\ntype hi there\nremove\n";
        let script = Script::parse(source).unwrap();
        assert_eq!(
            script.edits(),
            &[
                Edit::Forward,
                Edit::Backward,
                Edit::Up,
                Edit::Down,
                Edit::RowStart,
                Edit::RowEnd,
                Edit::Column(4),
                Edit::Insert('x'),
                Edit::Type("hi there".to_string()),
                Edit::Remove,
            ]
        );
    }

    #[test]
    fn test_parse_escapes() {
        let script = Script::parse("insert \\n\ninsert \\s\ninsert \\\\\ntype a\\tb\\nc\n").unwrap();
        assert_eq!(
            script.edits(),
            &[
                Edit::Insert('\n'),
                Edit::Insert(' '),
                Edit::Insert('\\'),
                Edit::Type("a\tb\nc".to_string()),
            ]
        );
    }

    #[test]
    fn test_type_keeps_inner_and_leading_spaces() {
        let script = Script::parse("type   indented  text").unwrap();
        assert_eq!(script.edits(), &[Edit::Type("  indented  text".to_string())]);
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let err = Script::parse("forward\n\njump\n").unwrap_err();
        assert!(matches!(
            err,
            ScriptError::UnknownCommand { line: 3, ref command } if command == "jump"
        ));
        assert_eq!(err.to_string(), "line 3: unknown command `jump`");
    }

    #[test]
    fn test_parse_missing_and_extra_arguments() {
        assert!(matches!(
            Script::parse("column").unwrap_err(),
            ScriptError::MissingArgument { line: 1, command: "column" }
        ));
        assert!(matches!(
            Script::parse("type").unwrap_err(),
            ScriptError::MissingArgument { line: 1, command: "type" }
        ));
        assert!(matches!(
            Script::parse("up 2").unwrap_err(),
            ScriptError::UnexpectedArgument { line: 1, command: "up", .. }
        ));
        assert!(matches!(
            Script::parse("column 1 2").unwrap_err(),
            ScriptError::UnexpectedArgument { line: 1, command: "column", .. }
        ));
    }

    #[test]
    fn test_parse_invalid_column_and_character() {
        assert!(matches!(
            Script::parse("column -1").unwrap_err(),
            ScriptError::InvalidColumn { line: 1, .. }
        ));
        assert!(matches!(
            Script::parse("insert ab").unwrap_err(),
            ScriptError::InvalidCharacter { line: 1, .. }
        ));
        assert!(matches!(
            Script::parse("insert \\q").unwrap_err(),
            ScriptError::UnknownEscape { line: 1, escape: 'q' }
        ));
    }

    #[test]
    fn test_display_parses_back() {
        let script: Script = [
            Edit::Type("a b\\c".to_string()),
            Edit::Insert(' '),
            Edit::Insert('\n'),
            Edit::Column(3),
            Edit::RowStart,
        ]
        .into_iter()
        .collect();
        let text = script.to_string();
        assert_eq!(Script::parse(&text).unwrap(), script);
    }

    #[test]
    fn test_display_escapes_other_whitespace() {
        let script: Script = [
            Edit::Insert('\r'),
            Edit::Insert('\u{a0}'),
            Edit::Insert('\u{b}'),
            Edit::Type("ab\r".to_string()),
            Edit::Type(" x\u{3000}y ".to_string()),
        ]
        .into_iter()
        .collect();
        let text = script.to_string();
        assert_eq!(
            text,
            "insert \\r\ninsert \\u{a0}\ninsert \\u{b}\ntype ab\\r\ntype  x\\u{3000}y \n"
        );
        assert_eq!(Script::parse(&text).unwrap(), script);
    }

    #[test]
    fn test_parse_unicode_escapes() {
        let script = Script::parse("insert \\u{e9}\ntype a\\u{1F600}b\n").unwrap();
        assert_eq!(
            script.edits(),
            &[Edit::Insert('é'), Edit::Type("a\u{1F600}b".to_string())]
        );
        for bad in ["insert \\u41", "insert \\u{zz}", "insert \\u{d800}", "insert \\u{41"] {
            assert!(
                matches!(
                    Script::parse(bad).unwrap_err(),
                    ScriptError::InvalidUnicodeEscape { line: 1, .. }
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_crlf_line_endings_are_not_text() {
        let script = Script::parse("type ab\r\nforward\r\n").unwrap();
        assert_eq!(script.edits(), &[Edit::Type("ab".to_string()), Edit::Forward]);
    }

    #[test]
    fn test_json_format() {
        let script: Script = [Edit::Insert('a'), Edit::Column(2), Edit::Up].into_iter().collect();
        let json = script.to_json().unwrap();
        assert_eq!(
            json,
            r#"[{"op":"insert","arg":"a"},{"op":"column","arg":2},{"op":"up"}]"#
        );
        assert_eq!(Script::from_json(&json).unwrap(), script);
    }

    #[test]
    fn test_from_json_rejects_unknown_op() {
        assert!(matches!(
            Script::from_json(r#"[{"op":"teleport"}]"#).unwrap_err(),
            ScriptError::Json(_)
        ));
    }

    #[test]
    fn test_replay_counts_edits_that_acted() {
        let script = Script::parse("type ab\nforward\nbackward\nremove\nremove\n").unwrap();
        let mut buf = TextBuffer::new();
        // forward and the second remove fail at the end of the buffer
        assert_eq!(script.replay(&mut buf), 3);
        assert_eq!(buf.text(), "a");
        assert!(buf.is_at_end());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn edit() -> impl Strategy<Value = Edit> {
            prop_oneof![
                Just(Edit::Forward),
                Just(Edit::Backward),
                Just(Edit::Up),
                Just(Edit::Down),
                Just(Edit::RowStart),
                Just(Edit::RowEnd),
                Just(Edit::Remove),
                any::<usize>().prop_map(Edit::Column),
                any::<char>().prop_map(Edit::Insert),
                any::<String>().prop_map(Edit::Type),
            ]
        }

        proptest! {
            #[test]
            fn display_parses_back(edits in proptest::collection::vec(edit(), 0..40)) {
                let script: Script = edits.into_iter().collect();
                let text = script.to_string();
                let parsed = Script::parse(&text);
                prop_assert!(parsed.is_ok(), "{:?} failed: {:?}", text, parsed);
                prop_assert_eq!(parsed.ok(), Some(script));
            }
        }
    }
}

//! L1 lexer: a line-oriented state machine.
//!
//! The lexer walks the source one physical line at a time, classifies each
//! line against the current state, and emits [`LexEvent`]s for the block
//! parser to consume. The block parser never inspects raw characters; all
//! tokenization, brace tracking, and multi-line `***` assembly happens here.

use crate::parser::ParseError;
use crate::types::{Statement, Token, TokenKind};

/// One lexer event, carrying the tokenized content of a source line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LexEvent {
    /// A top-level statement: `load …`, `fn … = … {`, `run …` or `run … {`.
    OpenBlock(Statement),
    /// `args = {` inside a parent body.
    OpenChild(Statement),
    /// A body line: a `key: value` pair (two tokens, multi-line values
    /// already assembled) or a bare line (one token).
    BodyLine(Statement),
    /// `}` closing a child body.
    CloseChild { line: usize },
    /// `}` closing a parent body.
    CloseBlock { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Global,
    InParentBody,
    InChildBody,
    InMultiline,
}

struct Multiline {
    line: usize,
    key: String,
    value: String,
}

/// Scan the whole source into an event stream. Any malformed line aborts
/// the scan with a line-attributed error.
pub(crate) fn scan(source: &str) -> Result<Vec<LexEvent>, ParseError> {
    let mut events = Vec::new();
    let mut state = LexState::Global;
    let mut multiline: Option<Multiline> = None;
    let mut last_line = 0;

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        last_line = line;
        match state {
            LexState::Global => scan_global(raw, line, &mut events, &mut state)?,
            LexState::InParentBody => {
                scan_parent_body(raw, line, &mut events, &mut state, &mut multiline)?
            }
            LexState::InChildBody => scan_child_body(raw, line, &mut events, &mut state)?,
            LexState::InMultiline => {
                let acc = multiline.as_mut().unwrap();
                let stripped = raw.trim_start_matches([' ', '\t']);
                if let Some(pos) = stripped.find("***") {
                    acc.value.push_str(&stripped[..pos]);
                    let done = multiline.take().unwrap();
                    events.push(LexEvent::BodyLine(Statement::with_tokens(
                        done.line,
                        vec![
                            Token::new(done.key, TokenKind::MapKey),
                            Token::text(done.value),
                        ],
                    )));
                    state = LexState::InParentBody;
                } else {
                    acc.value.push_str(stripped);
                    acc.value.push('\n');
                }
            }
        }
    }

    match state {
        LexState::Global => Ok(events),
        LexState::InMultiline => Err(ParseError::lex(
            last_line,
            "unterminated multi-line value, missing '***'",
        )),
        LexState::InParentBody | LexState::InChildBody => Err(ParseError::lex(
            last_line,
            "unterminated block, missing '}'",
        )),
    }
}

fn scan_global(
    raw: &str,
    line: usize,
    events: &mut Vec<LexEvent>,
    state: &mut LexState,
) -> Result<(), ParseError> {
    let words = split_symbols(raw);
    if words.is_empty() {
        return Ok(());
    }
    match words[0].as_str() {
        "}" => Err(ParseError::lex(line, "unbalanced '}'")),
        "load" => {
            if words.len() != 2 || words[1] == "{" || words[1] == "}" {
                return Err(ParseError::lex(line, "malformed load statement"));
            }
            events.push(LexEvent::OpenBlock(statement(line, &words)));
            Ok(())
        }
        "fn" => {
            // fn <name> = <function> {
            let ok = words.len() == 5
                && words[2] == "="
                && words[4] == "{"
                && !words[1].contains(['{', '}'])
                && !words[3].contains(['{', '}']);
            if !ok {
                return Err(ParseError::lex(
                    line,
                    "malformed fn statement, expected 'fn <name> = <function> {'",
                ));
            }
            events.push(LexEvent::OpenBlock(statement(line, &words)));
            *state = LexState::InParentBody;
            Ok(())
        }
        "run" => {
            let ok = match words.len() {
                2 => words[1] != "}",
                3 => words[2] == "{" && words[1] != "{" && words[1] != "}",
                _ => false,
            };
            if !ok {
                return Err(ParseError::lex(
                    line,
                    "malformed run statement, expected 'run <name>', 'run <name> {' or 'run {'",
                ));
            }
            if words.last().map(String::as_str) == Some("{") {
                *state = LexState::InParentBody;
            }
            events.push(LexEvent::OpenBlock(statement(line, &words)));
            Ok(())
        }
        other => Err(ParseError::lex(
            line,
            format!("unexpected statement at top level: '{}'", other),
        )),
    }
}

fn scan_parent_body(
    raw: &str,
    line: usize,
    events: &mut Vec<LexEvent>,
    state: &mut LexState,
    multiline: &mut Option<Multiline>,
) -> Result<(), ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    if trimmed == "}" {
        events.push(LexEvent::CloseBlock { line });
        *state = LexState::Global;
        return Ok(());
    }

    if let Some((key, value)) = split_pair(trimmed) {
        if let Some(suffix) = value.strip_prefix("***") {
            let mut acc = String::new();
            if !suffix.trim().is_empty() {
                acc.push_str(suffix);
            }
            acc.push('\n');
            *multiline = Some(Multiline {
                line,
                key: key.to_string(),
                value: acc,
            });
            *state = LexState::InMultiline;
        } else {
            events.push(LexEvent::BodyLine(pair_statement(line, key, value.trim())));
        }
        return Ok(());
    }

    let words = split_symbols(trimmed);
    if words == ["args", "=", "{"] {
        events.push(LexEvent::OpenChild(statement(line, &words)));
        *state = LexState::InChildBody;
        return Ok(());
    }
    if words.iter().any(|w| w == "{" || w == "}") {
        return Err(ParseError::structure(
            line,
            "nested blocks are not allowed inside a block body",
        ));
    }

    events.push(LexEvent::BodyLine(Statement::with_tokens(
        line,
        vec![Token::text(trimmed)],
    )));
    Ok(())
}

fn scan_child_body(
    raw: &str,
    line: usize,
    events: &mut Vec<LexEvent>,
    state: &mut LexState,
) -> Result<(), ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    if trimmed == "}" {
        events.push(LexEvent::CloseChild { line });
        *state = LexState::InParentBody;
        return Ok(());
    }
    match split_pair(trimmed) {
        Some((key, value)) => {
            events.push(LexEvent::BodyLine(pair_statement(line, key, value.trim())));
            Ok(())
        }
        None => Err(ParseError::structure(
            line,
            "expected 'key: value' inside args body",
        )),
    }
}

fn statement(line: usize, words: &[String]) -> Statement {
    Statement::with_tokens(line, words.iter().map(Token::text).collect())
}

fn pair_statement(line: usize, key: &str, value: &str) -> Statement {
    Statement::with_tokens(
        line,
        vec![Token::new(key, TokenKind::MapKey), Token::text(value)],
    )
}

/// Split a body line at its first `:` into a trimmed key and the raw value.
/// A single space directly after the colon is eaten; the rest of the line is
/// the value, verbatim.
fn split_pair(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(':')?;
    let key = line[..pos].trim();
    let value = line[pos + 1..].strip_prefix(' ').unwrap_or(&line[pos + 1..]);
    Some((key, value))
}

/// Whitespace tokenization with `=`, `{`, `}` recognized as single-character
/// tokens even when abutting other text.
fn split_symbols(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    for word in line.split_whitespace() {
        let mut current = String::new();
        for ch in word.chars() {
            match ch {
                '=' | '{' | '}' => {
                    if !current.is_empty() {
                        out.push(std::mem::take(&mut current));
                    }
                    out.push(ch.to_string());
                }
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_pairs(source: &str) -> Vec<(String, String)> {
        scan(source)
            .unwrap()
            .into_iter()
            .filter_map(|ev| match ev {
                LexEvent::BodyLine(stmt) if stmt.tokens.len() == 2 => {
                    Some((stmt.tokens[0].value.clone(), stmt.tokens[1].value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn splits_abutting_symbols() {
        assert_eq!(
            split_symbols("fn f2=function2{"),
            vec!["fn", "f2", "=", "function2", "{"]
        );
        assert_eq!(split_symbols("run\tfunction2{"), vec!["run", "function2", "{"]);
        assert_eq!(split_symbols("load cmd:root/function1"), vec!["load", "cmd:root/function1"]);
    }

    #[test]
    fn multiline_with_suffix() {
        let source = "run function3 {\n\tmulti1: ***hello1\n\thello2\n\t***\n}\n";
        assert_eq!(
            body_pairs(source),
            vec![("multi1".to_string(), "hello1\nhello2\n".to_string())]
        );
    }

    #[test]
    fn multiline_with_blank_suffix() {
        let source = "run function3 {\n\tmulti2: *** \n\thello1\n\thello2\n\t***\n}\n";
        assert_eq!(
            body_pairs(source),
            vec![("multi2".to_string(), "\nhello1\nhello2\n".to_string())]
        );
    }

    #[test]
    fn multiline_with_same_line_terminator() {
        let source = "run function3 {\n\tmulti3:*** \n\thello1\n\thello2***\n}\n";
        assert_eq!(
            body_pairs(source),
            vec![("multi3".to_string(), "\nhello1\nhello2".to_string())]
        );
    }

    #[test]
    fn brace_values_stay_verbatim() {
        let source = "run function3 {\n\tk : {(1+2+3)}\n}\n";
        assert_eq!(
            body_pairs(source),
            vec![("k".to_string(), "{(1+2+3)}".to_string())]
        );
    }

    #[test]
    fn stray_close_brace_is_an_error() {
        let err = scan("run function1\n}\n").unwrap_err();
        assert!(matches!(err, ParseError::Lex { line: 2, .. }));
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = scan("run function2 {\n\tk1:v1\n").unwrap_err();
        assert!(matches!(err, ParseError::Lex { .. }));
    }

    #[test]
    fn unterminated_multiline_is_an_error() {
        let err = scan("run function3 {\n\tm: ***\nhello\n").unwrap_err();
        assert!(matches!(err, ParseError::Lex { .. }));
    }
}

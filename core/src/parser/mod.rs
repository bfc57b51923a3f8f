//! L2 block parser for flowl sources.
//!
//! Consumes the L1 event stream and assembles the block tree: a flat list
//! of top-level `load`/`fn`/`run` blocks, each with its header tokens and
//! optional body. Every block is validated the moment it closes, so a
//! malformed source aborts with the first offending line.

pub mod semantic_validator;


use std::fmt;
use std::io::Read;

use crate::lexer::{self, LexEvent};
use crate::runqueue::RunQueue;
use crate::types::{
    Block, BlockBody, BlockLevel, BlockList, BodyError, Statement, Token, TokenKind,
};

use semantic_validator::Validator;

/* ===================== Errors ===================== */

/// Fatal parse or lowering failure. Every variant except `Io` carries the
/// offending source line number. Partial results are never returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Malformed line, unterminated multi-line literal, unbalanced brace.
    Lex { line: usize, message: String },
    /// A token value does not match the pattern its kind requires.
    Token { line: usize, message: String },
    /// Disallowed nesting, wrong body shape, stray closer.
    Structure { line: usize, message: String },
    /// A `run` references an unknown name, or a registration collides.
    Resolution { line: usize, message: String },
    /// The source stream could not be read.
    Io { message: String },
}

impl ParseError {
    pub(crate) fn lex(line: usize, message: impl Into<String>) -> Self {
        ParseError::Lex {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn token(line: usize, message: impl Into<String>) -> Self {
        ParseError::Token {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn structure(line: usize, message: impl Into<String>) -> Self {
        ParseError::Structure {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn resolution(line: usize, message: impl Into<String>) -> Self {
        ParseError::Resolution {
            line,
            message: message.into(),
        }
    }

    /// The source line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Lex { line, .. }
            | ParseError::Token { line, .. }
            | ParseError::Structure { line, .. }
            | ParseError::Resolution { line, .. } => Some(*line),
            ParseError::Io { .. } => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex { line, message } => {
                write!(f, "lex error on line {}: {}", line, message)
            }
            ParseError::Token { line, message } => {
                write!(f, "token error on line {}: {}", line, message)
            }
            ParseError::Structure { line, message } => {
                write!(f, "structure error on line {}: {}", line, message)
            }
            ParseError::Resolution { line, message } => {
                write!(f, "resolution error on line {}: {}", line, message)
            }
            ParseError::Io { message } => write!(f, "failed to read source: {}", message),
        }
    }
}

impl std::error::Error for ParseError {}

/* ===================== Public API ===================== */

/// Parse a flowl source into its block tree, without lowering.
pub fn parse_blocks<R: Read>(mut reader: R) -> Result<BlockList, ParseError> {
    let mut source = String::new();
    reader
        .read_to_string(&mut source)
        .map_err(|e| ParseError::Io {
            message: e.to_string(),
        })?;
    parse_blocks_str(&source)
}

/// Parse a flowl source and lower it into a run queue.
pub fn parse<R: Read>(reader: R) -> Result<(RunQueue, BlockList), ParseError> {
    let blocks = parse_blocks(reader)?;
    let queue = RunQueue::compile(&blocks)?;
    Ok((queue, blocks))
}

pub(crate) fn parse_blocks_str(source: &str) -> Result<BlockList, ParseError> {
    let events = lexer::scan(source)?;
    let mut parser = BlockParser::new();
    for event in events {
        parser.feed(event)?;
    }
    parser.finish()
}

/* ===================== Block assembly ===================== */

struct BlockParser {
    list: BlockList,
    /// The parent block currently being filled, if a body is open.
    parsing: Option<Block>,
    /// The `args` child currently being filled, if open.
    child: Option<Block>,
    validator: Validator,
}

impl BlockParser {
    fn new() -> Self {
        Self {
            list: BlockList::default(),
            parsing: None,
            child: None,
            validator: Validator::new(),
        }
    }

    fn feed(&mut self, event: LexEvent) -> Result<(), ParseError> {
        match event {
            LexEvent::OpenBlock(stmt) => self.open_block(stmt),
            LexEvent::OpenChild(stmt) => self.open_child(stmt),
            LexEvent::BodyLine(stmt) => self.body_line(stmt),
            LexEvent::CloseChild { line } => self.close_child(line),
            LexEvent::CloseBlock { line } => self.close_block(line),
        }
    }

    fn finish(self) -> Result<BlockList, ParseError> {
        // The lexer rejects unterminated blocks before we get here.
        debug_assert!(self.parsing.is_none() && self.child.is_none());
        Ok(self.list)
    }

    fn open_block(&mut self, stmt: Statement) -> Result<(), ParseError> {
        let line = stmt.line;
        let words: Vec<&str> = stmt.tokens.iter().map(|t| t.value.as_str()).collect();
        let mut block = Block::new(
            Token::text(words[0]),
            BlockLevel::Parent,
            line,
        );
        match words[0] {
            "load" => {
                block.target = Token::new(words[1], TokenKind::Load);
                self.close_and_push(block)
            }
            "fn" => {
                block.target = Token::new(words[1], TokenKind::FunctionName);
                block.operator = Token::new(words[2], TokenKind::Operator);
                block.type_or_value = Token::new(words[3], TokenKind::FunctionName);
                block.body = Some(BlockBody::raw());
                self.parsing = Some(block);
                Ok(())
            }
            "run" => {
                let has_body = words.last() == Some(&"{");
                if !has_body {
                    block.target = Token::new(words[1], TokenKind::FunctionName);
                    return self.close_and_push(block);
                }
                if words.len() == 2 {
                    // run { ... } is a parallel group
                    block.body = Some(BlockBody::list());
                } else {
                    block.target = Token::new(words[1], TokenKind::FunctionName);
                    block.body = Some(BlockBody::map());
                }
                self.parsing = Some(block);
                Ok(())
            }
            other => Err(ParseError::structure(
                line,
                format!("unknown block kind '{}'", other),
            )),
        }
    }

    fn open_child(&mut self, stmt: Statement) -> Result<(), ParseError> {
        let line = stmt.line;
        let parent = match self.parsing.as_ref() {
            Some(parent) => parent,
            None => {
                return Err(ParseError::structure(line, "'args' outside of a block"));
            }
        };
        if !parent.kind_is("fn") {
            return Err(ParseError::structure(
                line,
                "'args' is only allowed inside a fn block",
            ));
        }
        if parent.children.iter().any(|c| c.kind_is("args")) {
            return Err(ParseError::structure(line, "duplicate 'args' block"));
        }
        let mut child = Block::new(Token::text("args"), BlockLevel::Child, line);
        child.body = Some(BlockBody::map());
        self.child = Some(child);
        Ok(())
    }

    fn body_line(&mut self, stmt: Statement) -> Result<(), ParseError> {
        let line = stmt.line;
        if let Some(child) = self.child.as_mut() {
            return append(child.body.as_mut().unwrap(), stmt, line);
        }
        let parent = self.parsing.as_mut().expect("body line outside of a block");
        match parent.body.as_mut().unwrap() {
            BlockBody::Raw(_) => Err(ParseError::structure(
                line,
                "only an 'args' block is allowed inside a fn body",
            )),
            body @ BlockBody::Map(_) => {
                if stmt.tokens.len() != 2 {
                    return Err(ParseError::structure(
                        line,
                        "expected 'key: value' inside a run body",
                    ));
                }
                append(body, stmt, line)
            }
            body @ BlockBody::List(_) => append(body, stmt, line),
        }
    }

    fn close_child(&mut self, _line: usize) -> Result<(), ParseError> {
        let child = self.child.take().expect("no open args block");
        let parent = self.parsing.as_mut().expect("args outside of a block");
        parent.children.push(child);
        Ok(())
    }

    fn close_block(&mut self, _line: usize) -> Result<(), ParseError> {
        let block = self.parsing.take().expect("no open block");
        self.close_and_push(block)
    }

    fn close_and_push(&mut self, block: Block) -> Result<(), ParseError> {
        self.validator.validate(&block)?;
        self.list.push(block);
        Ok(())
    }
}

fn append(body: &mut BlockBody, stmt: Statement, line: usize) -> Result<(), ParseError> {
    body.append(stmt)
        .map_err(|e: BodyError| ParseError::structure(line, e.to_string()))
}

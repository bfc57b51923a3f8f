//! Core data model for parsed flowl sources: tokens, statements, blocks,
//! and the three body shapes a block can carry.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/* ===================== Tokens ===================== */

static INT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9][0-9]*$").unwrap());
static MAP_KEY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^:]+$").unwrap());
static OPERATOR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^=$").unwrap());
static LOAD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*:.*[a-zA-Z0-9]$").unwrap());
static FUNCTION_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").unwrap());

/// Lexical category of a token. Each kind carries a pattern its value must
/// match; `Text` and `Unknown` are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    #[default]
    Unknown,
    Int,
    Text,
    MapKey,
    Operator,
    FunctionName,
    Load,
}

impl TokenKind {
    fn pattern(&self) -> Option<&'static Regex> {
        match self {
            TokenKind::Int => Some(&INT_PATTERN),
            TokenKind::MapKey => Some(&MAP_KEY_PATTERN),
            TokenKind::Operator => Some(&OPERATOR_PATTERN),
            TokenKind::Load => Some(&LOAD_PATTERN),
            TokenKind::FunctionName => Some(&FUNCTION_NAME_PATTERN),
            TokenKind::Unknown | TokenKind::Text => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Unknown => "unknown",
            TokenKind::Int => "int",
            TokenKind::Text => "text",
            TokenKind::MapKey => "map key",
            TokenKind::Operator => "operator",
            TokenKind::FunctionName => "function name",
            TokenKind::Load => "load",
        };
        f.write_str(name)
    }
}

/// Returns true if `s` is a well-formed function name.
pub fn is_function_name(s: &str) -> bool {
    FUNCTION_NAME_PATTERN.is_match(s)
}

/// Returns true if `s` is an integer literal.
pub fn is_int_literal(s: &str) -> bool {
    INT_PATTERN.is_match(s)
}

/// A lexical atom: a string value plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(value, TokenKind::Text)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Whether the value matches the pattern its kind requires.
    /// `Text` and `Unknown` tokens always match.
    pub fn matches_pattern(&self) -> bool {
        match self.kind.pattern() {
            Some(pattern) => pattern.is_match(&self.value),
            None => true,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/* ===================== Statements ===================== */

/// An ordered token sequence together with its source line number. Used for
/// block headers and for each line inside a raw body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statement {
    pub line: usize,
    pub tokens: Vec<Token>,
}

impl Statement {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            tokens: Vec::new(),
        }
    }

    pub fn with_tokens(line: usize, tokens: Vec<Token>) -> Self {
        Self { line, tokens }
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn last_token(&self) -> Option<&Token> {
        self.tokens.last()
    }
}

/* ===================== Body shapes ===================== */

/// Error raised when a statement does not fit the body shape it is being
/// appended to. The parser converts this into a line-attributed error.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyError {
    DuplicateKey(String),
    WrongShape(&'static str),
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyError::DuplicateKey(key) => write!(f, "duplicate key '{}'", key),
            BodyError::WrongShape(expected) => write!(f, "expected {}", expected),
        }
    }
}

/// Raw body: statements preserved in order, as they appeared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawBody {
    lines: Vec<Statement>,
}

impl RawBody {
    pub fn statements(&self) -> &[Statement] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn append(&mut self, stmt: Statement) -> Result<(), BodyError> {
        self.lines.push(stmt);
        Ok(())
    }
}

/// Ordered key→value mapping. Insertion order is significant for iteration;
/// lookup is by key; keys are unique within a body.
///
/// Each entry is stored as a two-token statement (key, value) so the body
/// keeps its source line numbers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlMap {
    entries: Vec<Statement>,
}

impl FlMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|stmt| stmt.tokens[0].value == key)
            .map(|stmt| stmt.tokens[1].value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|stmt| (stmt.tokens[0].value.as_str(), stmt.tokens[1].value.as_str()))
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn append(&mut self, stmt: Statement) -> Result<(), BodyError> {
        if stmt.tokens.len() != 2 {
            return Err(BodyError::WrongShape("key: value"));
        }
        let key = &stmt.tokens[0].value;
        if self.contains_key(key) {
            return Err(BodyError::DuplicateKey(key.clone()));
        }
        self.entries.push(stmt);
        Ok(())
    }
}

/// Ordered sequence of function names, one per body line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlList {
    items: Vec<Statement>,
}

impl FlList {
    pub fn to_slice(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|stmt| stmt.tokens[0].value.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|stmt| stmt.tokens[0].value.as_str())
    }

    pub fn statements(&self) -> &[Statement] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn append(&mut self, stmt: Statement) -> Result<(), BodyError> {
        if stmt.tokens.len() != 1 {
            return Err(BodyError::WrongShape("a single function name"));
        }
        self.items.push(stmt);
        Ok(())
    }
}

/// The three body variants a block may carry, behind a common capability
/// surface (`append`, `len`, `statements`, `type_tag`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum BlockBody {
    Raw(RawBody),
    Map(FlMap),
    List(FlList),
}

impl BlockBody {
    pub fn raw() -> Self {
        BlockBody::Raw(RawBody::default())
    }

    pub fn map() -> Self {
        BlockBody::Map(FlMap::default())
    }

    pub fn list() -> Self {
        BlockBody::List(FlList::default())
    }

    pub fn append(&mut self, stmt: Statement) -> Result<(), BodyError> {
        match self {
            BlockBody::Raw(raw) => raw.append(stmt),
            BlockBody::Map(map) => map.append(stmt),
            BlockBody::List(list) => list.append(stmt),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BlockBody::Raw(raw) => raw.len(),
            BlockBody::Map(map) => map.len(),
            BlockBody::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn statements(&self) -> &[Statement] {
        match self {
            BlockBody::Raw(raw) => raw.statements(),
            BlockBody::Map(map) => map.statements(),
            BlockBody::List(list) => list.statements(),
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            BlockBody::Raw(_) => "raw",
            BlockBody::Map(_) => "map",
            BlockBody::List(_) => "list",
        }
    }

    pub fn as_map(&self) -> Option<&FlMap> {
        match self {
            BlockBody::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&FlList> {
        match self {
            BlockBody::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&RawBody> {
        match self {
            BlockBody::Raw(raw) => Some(raw),
            _ => None,
        }
    }
}

/* ===================== Blocks ===================== */

/// Nesting level of a block within the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockLevel {
    Global,
    #[default]
    Parent,
    Child,
}

/// The fundamental syntactic unit: a `load`, `fn`, `run`, or nested `args`
/// directive, with its header tokens, nesting level, children, and at most
/// one body.
///
/// Blocks are finalized at end of parsing and are read-only inputs to the
/// run-queue builder. Nesting is expressed by ownership (`children`); no
/// parent pointer is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: Token,
    pub target: Token,
    pub operator: Token,
    pub type_or_value: Token,
    pub level: BlockLevel,
    pub line: usize,
    pub children: Vec<Block>,
    pub body: Option<BlockBody>,
}

impl Block {
    pub fn new(kind: Token, level: BlockLevel, line: usize) -> Self {
        Self {
            kind,
            target: Token::default(),
            operator: Token::default(),
            type_or_value: Token::default(),
            level,
            line,
            children: Vec::new(),
            body: None,
        }
    }

    pub fn kind_is(&self, kind: &str) -> bool {
        self.kind.value == kind
    }

    pub fn body_map(&self) -> Option<&FlMap> {
        self.body.as_ref().and_then(BlockBody::as_map)
    }

    pub fn body_list(&self) -> Option<&FlList> {
        self.body.as_ref().and_then(BlockBody::as_list)
    }

    pub fn body_raw(&self) -> Option<&RawBody> {
        self.body.as_ref().and_then(BlockBody::as_raw)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Some(body) => write!(
                f,
                r#"kind="{}", target="{}", operator="{}", tov="{}", bodylen="{}""#,
                self.kind,
                self.target,
                self.operator,
                self.type_or_value,
                body.len()
            ),
            None => write!(
                f,
                r#"kind="{}", target="{}", operator="{}", tov="{}""#,
                self.kind, self.target, self.operator, self.type_or_value
            ),
        }
    }
}

/// All top-level blocks of a parsed source, in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockList {
    blocks: Vec<Block>,
}

impl BlockList {
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Visit every block in order. Returning an error from the callback
    /// stops iteration immediately and surfaces it to the caller.
    pub fn foreach<E>(&self, mut f: impl FnMut(&Block) -> Result<(), E>) -> Result<(), E> {
        for block in &self.blocks {
            f(block)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_patterns() {
        assert!(Token::new("123", TokenKind::Int).matches_pattern());
        assert!(!Token::new("0123", TokenKind::Int).matches_pattern());
        assert!(Token::new("=", TokenKind::Operator).matches_pattern());
        assert!(!Token::new("==", TokenKind::Operator).matches_pattern());
        assert!(Token::new("cmd:/tmp/function3", TokenKind::Load).matches_pattern());
        assert!(Token::new("go:function1", TokenKind::Load).matches_pattern());
        assert!(!Token::new("go:", TokenKind::Load).matches_pattern());
        assert!(!Token::new("1go:function1", TokenKind::Load).matches_pattern());
        assert!(Token::new("my-task_2", TokenKind::FunctionName).matches_pattern());
        assert!(!Token::new("3abc", TokenKind::FunctionName).matches_pattern());
        assert!(Token::new("anything at all", TokenKind::Text).matches_pattern());
        assert!(Token::new("k1", TokenKind::MapKey).matches_pattern());
        assert!(!Token::new("k:1", TokenKind::MapKey).matches_pattern());
    }

    #[test]
    fn map_preserves_insertion_order_and_rejects_duplicates() {
        let mut body = BlockBody::map();
        for (i, (k, v)) in [("b", "2"), ("a", "1"), ("c", "3")].iter().enumerate() {
            let stmt = Statement::with_tokens(
                i + 1,
                vec![Token::new(*k, TokenKind::MapKey), Token::text(*v)],
            );
            body.append(stmt).unwrap();
        }
        let map = body.as_map().unwrap();
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(map.get("a"), Some("1"));

        let dup =
            Statement::with_tokens(4, vec![Token::new("a", TokenKind::MapKey), Token::text("9")]);
        assert_eq!(
            body.append(dup),
            Err(BodyError::DuplicateKey("a".to_string()))
        );
    }

    #[test]
    fn list_keeps_order() {
        let mut body = BlockBody::list();
        for (i, name) in ["function1", "function2"].iter().enumerate() {
            body.append(Statement::with_tokens(i + 1, vec![Token::text(*name)]))
                .unwrap();
        }
        assert_eq!(
            body.as_list().unwrap().to_slice(),
            vec!["function1", "function2"]
        );
        assert_eq!(body.type_tag(), "list");
    }
}

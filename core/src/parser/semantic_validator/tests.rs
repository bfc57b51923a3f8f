//! Tests for the block validation rules

use crate::parser::{parse_blocks_str, ParseError};

fn expect_token_error(source: &str) {
    match parse_blocks_str(source) {
        Err(ParseError::Token { .. }) => {}
        other => panic!("expected a token error, got {:?}", other),
    }
}

fn expect_structure_error(source: &str) {
    match parse_blocks_str(source) {
        Err(ParseError::Structure { .. }) => {}
        other => panic!("expected a structure error, got {:?}", other),
    }
}

#[test]
fn load_target_must_be_driver_qualified() {
    expect_token_error("load function1\n");
    expect_token_error("load cmd:\n");
    expect_token_error("load 9cmd:function1\n");
}

#[test]
fn fn_tokens_must_be_names() {
    expect_token_error("fn 3f = function1 {\n}\n");
    expect_token_error("fn f1 = 3function {\n}\n");
}

#[test]
fn args_keys_must_be_non_empty() {
    let source = "fn f1 = function1 {\n\targs = {\n\t\t: v1\n\t}\n}\n";
    expect_token_error(source);
}

#[test]
fn run_target_must_be_a_name() {
    expect_token_error("run 3\n");
    expect_token_error("run 3 {\n\tk: v\n}\n");
}

#[test]
fn parallel_run_rejects_keywords() {
    expect_structure_error("run {\n\tfunction1\n\trun function2\n\tfunction3\n}\n");
    expect_structure_error("run {\n\tfunction1\n\tload xxxx\n\tfunction3\n}\n");
    expect_structure_error("run {\n\tfunction1\n\tinput k v\n\tfunction3\n}\n");
}

#[test]
fn parallel_run_rejects_numbers_and_bad_names() {
    expect_token_error("run {\n\tfunction1\n\t42\n}\n");
    expect_token_error("run {\n\tfunction1\n\ta b\n}\n");
}

#[test]
fn parallel_run_requires_two_names() {
    expect_structure_error("run {\n\tfunction1\n}\n");
}

#[test]
fn every_rule_has_an_id() {
    let validator = super::Validator::new();
    let ids: Vec<&str> = validator.rules().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["load-block", "fn-block", "run-block"]);
}

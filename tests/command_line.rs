// tests/command_line.rs

use std::path::PathBuf;

use proptest::prelude::*;
use xbot::exec::{parse_command_line, working_dir_for};

#[test]
fn splits_on_whitespace() {
    assert_eq!(
        parse_command_line("/opt/suite/run.sh --fast  -v"),
        vec!["/opt/suite/run.sh", "--fast", "-v"]
    );
}

#[test]
fn quoted_spans_are_single_arguments_without_quotes() {
    assert_eq!(
        parse_command_line(r#"/bin/run "a b" c 'd  e'"#),
        vec!["/bin/run", "a b", "c", "d  e"]
    );
}

#[test]
fn empty_quotes_yield_an_empty_argument() {
    assert_eq!(parse_command_line(r#"prog """#), vec!["prog", ""]);
}

#[test]
fn blank_input_yields_no_tokens() {
    assert!(parse_command_line("").is_empty());
    assert!(parse_command_line("   \t ").is_empty());
}

#[test]
fn working_dir_is_program_parent() {
    assert_eq!(
        working_dir_for("/opt/suite/run.sh"),
        Some(PathBuf::from("/opt/suite"))
    );
    assert_eq!(working_dir_for("run.sh"), None);
}

proptest! {
    // Plain words separated by arbitrary runs of spaces come back unchanged.
    #[test]
    fn plain_words_round_trip(words in proptest::collection::vec("[a-zA-Z0-9_./-]{1,12}", 1..8),
                              gaps in proptest::collection::vec(1usize..4, 8)) {
        let mut line = String::new();
        for (i, w) in words.iter().enumerate() {
            if i > 0 {
                line.push_str(&" ".repeat(gaps[i % gaps.len()]));
            }
            line.push_str(w);
        }
        prop_assert_eq!(parse_command_line(&line), words);
    }

    // A double-quoted span containing spaces is one argument.
    #[test]
    fn double_quoted_span_is_preserved(inner in "[a-z ]{0,20}") {
        let line = format!("prog \"{inner}\" tail");
        prop_assert_eq!(parse_command_line(&line), vec!["prog".to_string(), inner, "tail".to_string()]);
    }
}

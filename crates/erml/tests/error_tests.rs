//! Tests for error categories and messages

use erml::core::DiagramError;
use erml::parse;

/// Compile `input` and return the error it must produce
fn compile_error(input: &str) -> DiagramError {
    let err = parse(input).unwrap_err();
    match err.downcast::<DiagramError>() {
        Ok(error) => error,
        Err(other) => panic!("expected a DiagramError, got {}", other),
    }
}

fn assert_parse_error(input: &str, line: usize, message: &str) {
    match compile_error(input) {
        DiagramError::ParseError {
            message: actual,
            line: actual_line,
        } => {
            assert_eq!(actual, message, "input: {:?}", input);
            assert_eq!(actual_line, line, "input: {:?}", input);
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_error_display() {
    let error = DiagramError::parse_error("Line 2: entity 'X' does not exist", 2);
    assert_eq!(
        error.to_string(),
        "Parse error: Line 2: entity 'X' does not exist"
    );
    assert_eq!(error.line(), Some(2));
    assert!(!error.is_internal());

    let internal = DiagramError::internal_error("broken");
    assert_eq!(internal.to_string(), "Internal error: broken");
    assert_eq!(internal.line(), None);
    assert!(internal.is_internal());
}

#[test]
fn test_symbol_errors() {
    assert_parse_error("A: x\nB: y: z", 2, "Too many ':' in line 2");
    assert_parse_error("A: x\n\n: y", 3, "Symbol cannot be empty on line 3");
    assert_parse_error(
        "A: x\nB.c: y",
        2,
        "Entity 'B.c' (line 2) is not valid, should only contain alphanumeric characters, underscores and dashes",
    );
    assert_parse_error(
        "A: x\nB: y\n<A>: =1>B",
        3,
        "Relationship 'A' (line 3) is redefined: conflicts with entity 'A' (line 1)",
    );
}

#[test]
fn test_line_numbers_skip_blank_lines() {
    assert_parse_error(
        "\n\nA: x\n\n\nA: y",
        6,
        "Entity 'A' (line 6) is redefined: conflicts with entity 'A' (line 3)",
    );
}

#[test]
fn test_indentation_errors() {
    assert_parse_error("  A: x", 1, "First line of script (line 1) cannot have whitespace");
    assert_parse_error(
        "A: x\n    B:\n  C:",
        3,
        "Children of entity 'A' (line 1) have inconsistent indentation: Entity 'C' (line 3) has different indentation than line 2",
    );
}

#[test]
fn test_block_structure_errors() {
    assert_parse_error(
        "A: x\n  B:\n  C:\n  B\n  D:",
        4,
        "Line 4: non-prefixed lines must be last line in block",
    );
    assert_parse_error("A: x\n+y", 2, "Line 2: '+' lines must have a space after '+'");
    assert_parse_error("A: x\n[B]", 2, "Line 2: subclass reference lines must be owned by an entity");
    assert_parse_error(
        "A: x\nB: y\n<R>: =1>A\n  C: z",
        4,
        "Entity 'C' (line 4) cannot be owned by relationship 'R' (line 3)",
    );
}

#[test]
fn test_attribute_errors() {
    assert_parse_error("A: id id", 1, "Attribute 'id' (line 1) is redefined");
    assert_parse_error("A: x\n+ n{a", 2, "Unmatched brace at line 2");
    assert_parse_error(
        "A: tags[]{a b}",
        1,
        "Composite attribute 'tags' (line 1) cannot be a list",
    );
}

#[test]
fn test_relationship_errors() {
    assert_parse_error("A: x\n<R>: =1>B", 2, "Line 2: entity 'B' does not exist");
    assert_parse_error(
        "A: x\nB: y\n<R>: =N>A =N>B",
        3,
        "Line 3: cardinality 'N' is already defined",
    );
    assert_parse_error(
        "A: x\n<R>: =1>A =N>A",
        2,
        "Line 2: entity 'A' is already an endpoint",
    );
}

#[test]
fn test_subclass_errors() {
    assert_parse_error(
        "A: x\n  B:\n  C:\n  B^C|A",
        4,
        "Line 4: conflicting subclass definition, '^' and '|' cannot be used together",
    );
    assert_parse_error(
        "A: x\n  B:\nD: y\n  E:\n  E|B",
        5,
        "Line 5: entity 'B' is not included in this scope",
    );
    assert_parse_error("A: x\n  [Ghost]", 2, "Line 2: entity Ghost does not exist");
}

#[test]
fn test_key_in_subclass_errors() {
    assert_parse_error(
        "A: [id]\n  B: [code]",
        2,
        "Attribute 'code' (line 2) cannot be a key attribute because it is in a subclass entity",
    );
    assert_parse_error(
        "X: [k]\nA: [id]\n  [X]",
        3,
        "Attribute 'k' (line 3) cannot be a key attribute because it is in a subclass entity",
    );
    // Reported once the referenced entity is declared, ahead of later lines
    assert_parse_error(
        "A: [id]\n  [X]\nX: [k]\n<R>: =1>Ghost",
        2,
        "Attribute 'k' (line 2) cannot be a key attribute because it is in a subclass entity",
    );
}

#[test]
fn test_first_error_wins() {
    // Malformed lines are reported before redefinitions
    assert_parse_error("A: x\nB: y: z\nA: w", 2, "Too many ':' in line 2");
}

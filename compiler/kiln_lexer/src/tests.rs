#![allow(clippy::unwrap_used)]

use super::*;
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenKind> {
    let mut interner = StringInterner::new();
    lex(source, 0, &mut interner)
        .unwrap()
        .iter()
        .map(|t| t.kind)
        .collect()
}

fn lex_error(source: &str) -> Diagnostic {
    let mut interner = StringInterner::new();
    match lex(source, 0, &mut interner) {
        Ok(tokens) => panic!("expected a lex error, got {tokens:?}"),
        Err(diagnostic) => diagnostic,
    }
}

#[test]
fn test_function_header() {
    let mut interner = StringInterner::new();
    let tokens = lex("function f(x) { return x; }", 0, &mut interner).unwrap();
    let f = interner.get("f").unwrap();
    let x = interner.get("x").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Function,
            TokenKind::Ident(f),
            TokenKind::LParen,
            TokenKind::Ident(x),
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Return,
            TokenKind::Ident(x),
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_longest_operator_match() {
    let ops: Vec<_> = kinds("=== !== == != += -= *= /= %= ++ --")
        .into_iter()
        .filter(|k| *k != TokenKind::Eof)
        .collect();
    assert_eq!(
        ops,
        vec![
            TokenKind::EqEqEq,
            TokenKind::BangEqEq,
            TokenKind::EqEq,
            TokenKind::BangEq,
            TokenKind::PlusEq,
            TokenKind::MinusEq,
            TokenKind::StarEq,
            TokenKind::SlashEq,
            TokenKind::PercentEq,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
        ]
    );
}

#[test]
fn test_numbers() {
    let numbers: Vec<f64> = kinds("0 42 3.5 .25 1e3 2E-2 0xff")
        .into_iter()
        .filter_map(|k| match k {
            TokenKind::Number(bits) => Some(f64::from_bits(bits)),
            _ => None,
        })
        .collect();
    assert_eq!(numbers, vec![0.0, 42.0, 3.5, 0.25, 1000.0, 0.02, 255.0]);
}

#[test]
fn test_string_escapes_are_cooked() {
    let mut interner = StringInterner::new();
    let tokens = lex(r#"'a\n' "b\"c" '\x41B'"#, 0, &mut interner).unwrap();
    let strings: Vec<&str> = tokens
        .iter()
        .filter_map(|t| match t.kind {
            TokenKind::String(name) => Some(interner.lookup(name)),
            _ => None,
        })
        .collect();
    assert_eq!(strings, vec!["a\n", "b\"c", "AB"]);
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(kinds("// line\nx /* block\n comment */ ;"), kinds("x ;"));
}

#[test]
fn test_spans_are_offset_by_base() {
    let mut interner = StringInterner::new();
    let tokens = lex("a + b", 100, &mut interner).unwrap();
    let spans: Vec<Span> = tokens.iter().map(|t| t.span).collect();
    assert_eq!(
        spans,
        vec![
            Span::new(100, 101),
            Span::new(102, 103),
            Span::new(104, 105),
            Span::new(105, 105),
        ]
    );
}

#[test]
fn test_invalid_character() {
    let diagnostic = lex_error("^^^");
    assert_eq!(diagnostic.code, ErrorCode::E0002);
    assert_eq!(diagnostic.primary_span(), Some(Span::new(0, 1)));
}

#[test]
fn test_unterminated_string() {
    assert_eq!(lex_error("'abc").code, ErrorCode::E0001);
    assert_eq!(lex_error("'ab\nc'").code, ErrorCode::E0001);
}

#[test]
fn test_unterminated_comment() {
    assert_eq!(lex_error("x /* never closed").code, ErrorCode::E0004);
}

#[test]
fn test_number_running_into_identifier() {
    assert_eq!(lex_error("3in").code, ErrorCode::E0003);
    assert_eq!(lex_error("1e").code, ErrorCode::E0003);
}

#[test]
fn test_invalid_escape() {
    assert_eq!(lex_error(r"'\x4'").code, ErrorCode::E0005);
}

#[test]
fn test_unicode_identifier() {
    let mut interner = StringInterner::new();
    let tokens = lex("größe", 0, &mut interner).unwrap();
    assert_eq!(
        tokens.get(0).kind,
        TokenKind::Ident(interner.get("größe").unwrap())
    );
    assert_eq!(tokens.len(), 2);
}

use kiln_diagnostic::{ErrorCode, PhaseOutcome};
use kiln_ir::{BinaryOp, ExprKind, Span, StmtKind, UpdateOp};
use pretty_assertions::assert_eq;

use super::{parse, parse_ok};

fn syntax_error_code(source: &str) -> ErrorCode {
    match parse(source) {
        PhaseOutcome::SyntaxError(diagnostic) => diagnostic.code,
        other => panic!("expected syntax error, got ok={}", other.is_ok()),
    }
}

#[test]
fn test_named_and_anonymous_units() {
    let named = parse_ok("function f(x) { return x; }");
    assert_eq!(named.name(), Some("f"));
    assert_eq!(named.scope().parameter_count(), 1);

    let anonymous = parse_ok("(a, b) { a * b; }");
    assert_eq!(anonymous.name(), None);
    assert_eq!(anonymous.scope().parameter_count(), 2);

    let keyword_only = parse_ok("function () { }");
    assert_eq!(keyword_only.name(), None);
    assert!(keyword_only.literal().body.is_empty());
}

#[test]
fn test_binary_precedence() {
    let parsed = parse_ok("function f() { return 1 + 2 * 3; }");
    let arena = parsed.arena();
    let body = arena.stmt_list(parsed.literal().body);
    let StmtKind::Return(Some(value)) = arena.stmt(body[0]).kind else {
        panic!("expected return statement");
    };
    let ExprKind::Binary {
        op: BinaryOp::Add,
        left,
        right,
    } = arena.expr(value).kind
    else {
        panic!("expected addition at the root");
    };
    assert_eq!(arena.expr(left).kind.as_number(), Some(1.0));
    assert!(matches!(
        arena.expr(right).kind,
        ExprKind::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn test_left_associative_subtraction() {
    let parsed = parse_ok("function f() { return 8 - 4 - 2; }");
    let arena = parsed.arena();
    let body = arena.stmt_list(parsed.literal().body);
    let StmtKind::Return(Some(value)) = arena.stmt(body[0]).kind else {
        panic!("expected return statement");
    };
    let ExprKind::Binary { left, right, .. } = arena.expr(value).kind else {
        panic!("expected binary expression");
    };
    assert!(matches!(
        arena.expr(left).kind,
        ExprKind::Binary {
            op: BinaryOp::Sub,
            ..
        }
    ));
    assert_eq!(arena.expr(right).kind.as_number(), Some(2.0));
}

#[test]
fn test_statements() {
    let parsed = parse_ok(
        "function f(n) {
            var total = 0, i;
            for (i = 0; i < n; i++) {
                if (i % 2 == 0) continue; else total += i;
            }
            while (true) { break; }
            ;
            return total > 10 ? total : -total;
        }",
    );
    let arena = parsed.arena();
    let kinds: Vec<_> = arena
        .stmt_list(parsed.literal().body)
        .iter()
        .map(|&stmt| std::mem::discriminant(&arena.stmt(stmt).kind))
        .collect();
    let expected: Vec<_> = [
        StmtKind::Var(kiln_ir::VarDeclRange::EMPTY),
        StmtKind::For {
            init: None,
            cond: None,
            update: None,
            body: kiln_ir::StmtId::new(0),
        },
        StmtKind::While {
            cond: kiln_ir::ExprId::new(0),
            body: kiln_ir::StmtId::new(0),
        },
        StmtKind::Empty,
        StmtKind::Return(None),
    ]
    .iter()
    .map(std::mem::discriminant)
    .collect();
    assert_eq!(kinds, expected);
}

#[test]
fn test_update_expressions() {
    let parsed = parse_ok("function f(x) { ++x; x--; }");
    let arena = parsed.arena();
    let updates: Vec<_> = arena
        .stmt_list(parsed.literal().body)
        .iter()
        .map(|&stmt| match arena.stmt(stmt).kind {
            StmtKind::Expr(expr) => match arena.expr(expr).kind {
                ExprKind::Update { op, prefix, .. } => (op, prefix),
                ref other => panic!("expected update, got {other:?}"),
            },
            ref other => panic!("expected expression statement, got {other:?}"),
        })
        .collect();
    assert_eq!(
        updates,
        vec![(UpdateOp::Increment, true), (UpdateOp::Decrement, false)]
    );
}

#[test]
fn test_call_arguments() {
    let parsed = parse_ok("function f(g) { return g(1, 'two')(3); }");
    let arena = parsed.arena();
    let body = arena.stmt_list(parsed.literal().body);
    let StmtKind::Return(Some(value)) = arena.stmt(body[0]).kind else {
        panic!("expected return statement");
    };
    let ExprKind::Call { callee, args } = arena.expr(value).kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 1);
    let ExprKind::Call { args: inner, .. } = arena.expr(callee).kind else {
        panic!("expected inner call");
    };
    assert_eq!(inner.len(), 2);
}

#[test]
fn test_invalid_character() {
    assert_eq!(syntax_error_code("^^^"), ErrorCode::E0002);
}

#[test]
fn test_missing_semicolon() {
    match parse("function f(x) { return x }") {
        PhaseOutcome::SyntaxError(diagnostic) => {
            assert_eq!(diagnostic.code, ErrorCode::E1003);
            assert_eq!(diagnostic.message, "Expected ';' but found token '}'");
        }
        other => panic!("expected syntax error, got ok={}", other.is_ok()),
    }
}

#[test]
fn test_unexpected_end_of_input() {
    match parse("function f(x) { return x;") {
        PhaseOutcome::SyntaxError(diagnostic) => {
            assert_eq!(diagnostic.message, "Unexpected end of input");
        }
        other => panic!("expected syntax error, got ok={}", other.is_ok()),
    }
}

#[test]
fn test_missing_expression() {
    match parse("function f(x) { return ); }") {
        PhaseOutcome::SyntaxError(diagnostic) => {
            assert_eq!(diagnostic.code, ErrorCode::E1002);
            assert_eq!(diagnostic.message, "Unexpected token ')'");
            assert_eq!(diagnostic.primary_span(), Some(Span::new(23, 24)));
        }
        other => panic!("expected syntax error, got ok={}", other.is_ok()),
    }
    assert_eq!(syntax_error_code("function f() { var a = ; }"), ErrorCode::E1002);
}

#[test]
fn test_trailing_tokens_rejected() {
    assert_eq!(syntax_error_code("function f() {} x"), ErrorCode::E1001);
}

#[test]
fn test_duplicate_parameter() {
    assert_eq!(syntax_error_code("function f(a, a) {}"), ErrorCode::E1006);
}

#[test]
fn test_break_outside_loop() {
    assert_eq!(syntax_error_code("function f() { break; }"), ErrorCode::E1007);
    assert_eq!(
        syntax_error_code("function f() { while (true) {} continue; }"),
        ErrorCode::E1007
    );
}

#[test]
fn test_invalid_assignment_target() {
    assert_eq!(syntax_error_code("function f() { 1 = 2; }"), ErrorCode::E1005);
    assert_eq!(syntax_error_code("function f(a) { a()++; }"), ErrorCode::E1005);
}

#[test]
fn test_parameter_name_must_be_identifier() {
    assert_eq!(syntax_error_code("function f(1) {}"), ErrorCode::E1004);
}

#[test]
fn test_spans_are_script_offsets() {
    let source = "var padding; function f(x) { return x; }";
    let start = source.find("function").unwrap();
    let outcome = crate::parse_function(&crate::ParseRequest {
        source,
        range: start..source.len(),
        max_stack_bytes: kiln_stack::DEFAULT_MAX_STACK_BYTES,
        abort: None,
    });
    let PhaseOutcome::Ok(parsed) = outcome else {
        panic!("expected successful parse");
    };
    assert_eq!(parsed.literal().span.to_range(), start..source.len());
    let x = parsed.lookup_variable("x").unwrap();
    assert_eq!(&source[x.span.to_range()], "x");
}

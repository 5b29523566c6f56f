//! Parser state and token cursor helpers.
//!
//! Grammar rules live in `stmt.rs` and `expr.rs` as further `impl Parser`
//! blocks, the way each syntactic category gets its own file.

mod expr;
mod stmt;

use std::sync::atomic::{AtomicBool, Ordering};

use kiln_diagnostic::{expected_token, stack_overflow, unexpected_token, Diagnostic, ErrorCode};
use kiln_ir::{
    AstArena, FunctionLiteral, FunctionScope, Name, Span, StringInterner, Token, TokenKind,
    TokenList,
};
use kiln_stack::{ensure_sufficient_stack, StackBudget};

use crate::{ParseFailure, ParseRequest, ParseResult, PARSE_FRAME_BYTES};

pub(crate) struct Parser<'a> {
    tokens: &'a TokenList,
    interner: &'a StringInterner,
    pos: usize,
    arena: AstArena,
    scope: FunctionScope,
    budget: StackBudget,
    abort: Option<&'a AtomicBool>,
    /// Number of enclosing loops, for `break` / `continue`.
    loop_depth: u32,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: &'a TokenList,
        interner: &'a StringInterner,
        request: &ParseRequest<'a>,
    ) -> Self {
        Parser {
            tokens,
            interner,
            pos: 0,
            arena: AstArena::new(),
            scope: FunctionScope::new(),
            budget: StackBudget::new(request.max_stack_bytes),
            abort: request.abort,
            loop_depth: 0,
        }
    }

    /// Parse `[function] [name] ( params ) { body }` followed by end of input.
    pub(crate) fn parse_unit(mut self) -> ParseResult<(AstArena, FunctionLiteral)> {
        let start = self.current_span();
        if self.check(TokenKind::Function) {
            self.advance();
        }
        let name = match self.current_kind() {
            TokenKind::Ident(name) => {
                self.advance();
                Some(name)
            }
            _ => None,
        };

        self.parse_parameters()?;
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Eof) {
                return Err(self.unexpected().into());
            }
            body.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        if !self.check(TokenKind::Eof) {
            return Err(self.unexpected().into());
        }

        self.scope.bind_local_references();
        let body = self.arena.alloc_stmt_list(body);
        Ok((
            self.arena,
            FunctionLiteral {
                name,
                body,
                scope: self.scope,
                span,
            },
        ))
    }

    fn parse_parameters(&mut self) -> ParseResult<()> {
        self.expect(TokenKind::LParen)?;
        if self.check(TokenKind::RParen) {
            self.advance();
            return Ok(());
        }
        loop {
            let span = self.current_span();
            let name = self.expect_ident()?;
            if self.scope.declare_parameter(name, span).is_err() {
                return Err(Diagnostic::error(ErrorCode::E1006)
                    .with_message("Duplicate parameter name not allowed in this context")
                    .with_label(span, "declared again here")
                    .into());
            }
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect(TokenKind::RParen)?;
            return Ok(());
        }
    }

    /// Run `f` one frame deeper, charging the stack budget for it.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.budget.enter(PARSE_FRAME_BYTES).is_err() {
            let span = self.current_span();
            return Err(stack_overflow(span, "parsing", self.budget.limit()).into());
        }
        let result = ensure_sufficient_stack(|| f(self));
        self.budget.exit(PARSE_FRAME_BYTES);
        result
    }

    fn check_abort(&self) -> ParseResult<()> {
        match self.abort {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ParseFailure::Aborted),
            _ => Ok(()),
        }
    }

    // Cursor

    fn current(&self) -> &Token {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens.get(self.pos - 1).span
        } else {
            Span::DUMMY
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn advance(&mut self) -> Token {
        let token = *self.current();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let expected = kind.to_string();
        Err(expected_token(self.current_span(), &expected, self.describe_current()).into())
    }

    fn expect_ident(&mut self) -> ParseResult<Name> {
        if let TokenKind::Ident(name) = self.current_kind() {
            self.advance();
            return Ok(name);
        }
        Err(Diagnostic::error(ErrorCode::E1004)
            .with_message(format!("Expected identifier but found {}", self.describe_current()))
            .with_label(self.current_span(), "expected identifier")
            .into())
    }

    /// Human-readable description of the current token for messages.
    fn describe_current(&self) -> String {
        match self.current_kind() {
            TokenKind::Ident(name) => format!("identifier '{}'", self.interner.lookup(name)),
            TokenKind::Number(_) => "number".to_string(),
            TokenKind::String(_) => "string".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            kind => format!("token {kind}"),
        }
    }

    fn unexpected(&self) -> Diagnostic {
        unexpected_token(self.current_span(), self.describe_current())
    }
}

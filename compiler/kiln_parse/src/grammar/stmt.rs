//! Statement parsing.

use kiln_diagnostic::{Diagnostic, ErrorCode};
use kiln_ir::{Stmt, StmtId, StmtKind, TokenKind, VarDecl, VarDeclRange};

use super::Parser;
use crate::ParseResult;

impl Parser<'_> {
    /// Parse one statement. Every statement is a budgeted frame and an
    /// abort point.
    pub(super) fn parse_statement(&mut self) -> ParseResult<StmtId> {
        self.check_abort()?;
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> ParseResult<StmtId> {
        let start = self.current_span();
        let kind = match self.current_kind() {
            TokenKind::LBrace => {
                self.advance();
                let mut stmts = Vec::new();
                while !self.check(TokenKind::RBrace) {
                    if self.check(TokenKind::Eof) {
                        return Err(self.unexpected().into());
                    }
                    stmts.push(self.parse_statement()?);
                }
                self.advance();
                StmtKind::Block(self.arena.alloc_stmt_list(stmts))
            }
            TokenKind::Semicolon => {
                self.advance();
                StmtKind::Empty
            }
            TokenKind::Var => {
                self.advance();
                let decls = self.parse_var_declarations()?;
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Var(decls)
            }
            TokenKind::If => {
                self.advance();
                let cond = self.parse_paren_expr()?;
                let then_branch = self.parse_statement()?;
                let else_branch = if self.check(TokenKind::Else) {
                    self.advance();
                    Some(self.parse_statement()?)
                } else {
                    None
                };
                StmtKind::If {
                    cond,
                    then_branch,
                    else_branch,
                }
            }
            TokenKind::While => {
                self.advance();
                let cond = self.parse_paren_expr()?;
                let body = self.parse_loop_body()?;
                StmtKind::While { cond, body }
            }
            TokenKind::For => {
                self.advance();
                self.parse_for_tail()?
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Return(value)
            }
            kind @ (TokenKind::Break | TokenKind::Continue) => {
                if self.loop_depth == 0 {
                    let keyword = if kind == TokenKind::Break {
                        "break"
                    } else {
                        "continue"
                    };
                    return Err(Diagnostic::error(ErrorCode::E1007)
                        .with_message(format!("Illegal {keyword} statement"))
                        .with_label(start, "not inside a loop")
                        .into());
                }
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                if kind == TokenKind::Break {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                }
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Expr(expr)
            }
        };
        let span = start.merge(self.previous_span());
        Ok(self.arena.alloc_stmt(Stmt::new(kind, span)))
    }

    /// `name [= init] {, name [= init]}` after the `var` keyword.
    fn parse_var_declarations(&mut self) -> ParseResult<VarDeclRange> {
        let mut decls = Vec::new();
        loop {
            let span = self.current_span();
            let name = self.expect_ident()?;
            self.scope.declare_var(name, span);
            let target = self.scope.add_reference(name, span);
            let init = if self.check(TokenKind::Eq) {
                self.advance();
                Some(self.parse_assignment()?)
            } else {
                None
            };
            decls.push(VarDecl {
                name,
                target,
                init,
                span: span.merge(self.previous_span()),
            });
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(self.arena.alloc_var_decls(decls))
    }

    /// `( init ; cond ; update ) body` after the `for` keyword.
    fn parse_for_tail(&mut self) -> ParseResult<StmtKind> {
        self.expect(TokenKind::LParen)?;

        let init = match self.current_kind() {
            TokenKind::Semicolon => None,
            TokenKind::Var => {
                let start = self.advance().span;
                let decls = self.parse_var_declarations()?;
                let span = start.merge(self.previous_span());
                Some(self.arena.alloc_stmt(Stmt::new(StmtKind::Var(decls), span)))
            }
            _ => {
                let expr = self.parse_expression()?;
                let span = self.arena.expr(expr).span;
                Some(self.arena.alloc_stmt(Stmt::new(StmtKind::Expr(expr), span)))
            }
        };
        self.expect(TokenKind::Semicolon)?;

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::RParen)?;

        let body = self.parse_loop_body()?;
        Ok(StmtKind::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn parse_loop_body(&mut self) -> ParseResult<StmtId> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body
    }
}

//! Expression parsing.
//!
//! Assignment and the conditional operator are right-associative and recurse
//! through budgeted frames. Binary operators use precedence climbing, so a
//! long left-associative chain such as `a + b + c + ...` is parsed in a loop
//! and costs no stack per operand.

use kiln_diagnostic::{expected_expression, Diagnostic, ErrorCode};
use kiln_ir::{
    AssignOp, BinaryOp, Expr, ExprId, ExprKind, RefId, Span, TokenKind, UnaryOp, UpdateOp,
};

use super::Parser;
use crate::ParseResult;

impl Parser<'_> {
    pub(super) fn parse_expression(&mut self) -> ParseResult<ExprId> {
        self.parse_assignment()
    }

    pub(super) fn parse_paren_expr(&mut self) -> ParseResult<ExprId> {
        self.expect(TokenKind::LParen)?;
        let expr = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }

    pub(super) fn parse_assignment(&mut self) -> ParseResult<ExprId> {
        self.nested(Self::parse_assignment_inner)
    }

    fn parse_assignment_inner(&mut self) -> ParseResult<ExprId> {
        let left = self.parse_conditional()?;
        let Some(op) = assign_op(self.current_kind()) else {
            return Ok(left);
        };
        let left_span = self.arena.expr(left).span;
        let target = self.assignment_target(left)?;
        self.advance();
        let value = self.parse_assignment()?;
        let span = left_span.merge(self.arena.expr(value).span);
        Ok(self.alloc(ExprKind::Assign { op, target, value }, span))
    }

    fn parse_conditional(&mut self) -> ParseResult<ExprId> {
        let cond = self.parse_binary(1)?;
        if !self.check(TokenKind::Question) {
            return Ok(cond);
        }
        self.advance();
        let then_expr = self.parse_assignment()?;
        self.expect(TokenKind::Colon)?;
        let else_expr = self.parse_assignment()?;
        let span = self
            .arena
            .expr(cond)
            .span
            .merge(self.arena.expr(else_expr).span);
        Ok(self.alloc(
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            },
            span,
        ))
    }

    /// Binary operators binding at least as tight as `min_precedence`.
    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<ExprId> {
        let mut left = self.parse_unary()?;
        while let Some(op) = binary_op(self.current_kind()) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            let span = self.arena.expr(left).span.merge(self.arena.expr(right).span);
            left = self.alloc(ExprKind::Binary { op, left, right }, span);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<ExprId> {
        let start = self.current_span();
        let op = match self.current_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                self.advance();
                let operand = self.nested(Self::parse_unary)?;
                let target = self.update_target(operand)?;
                let span = start.merge(self.arena.expr(operand).span);
                return Ok(self.alloc(
                    ExprKind::Update {
                        op: update_op(kind),
                        prefix: true,
                        target,
                    },
                    span,
                ));
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        let span = start.merge(self.arena.expr(operand).span);
        Ok(self.alloc(ExprKind::Unary { op, operand }, span))
    }

    fn parse_postfix(&mut self) -> ParseResult<ExprId> {
        let expr = self.parse_call()?;
        let kind = self.current_kind();
        if !matches!(kind, TokenKind::PlusPlus | TokenKind::MinusMinus) {
            return Ok(expr);
        }
        let target = self.update_target(expr)?;
        let end = self.advance().span;
        let span = self.arena.expr(expr).span.merge(end);
        Ok(self.alloc(
            ExprKind::Update {
                op: update_op(kind),
                prefix: false,
                target,
            },
            span,
        ))
    }

    fn parse_call(&mut self) -> ParseResult<ExprId> {
        let mut callee = self.parse_primary()?;
        while self.check(TokenKind::LParen) {
            self.advance();
            let mut args = Vec::new();
            if !self.check(TokenKind::RParen) {
                loop {
                    args.push(self.parse_assignment()?);
                    if !self.check(TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
            }
            let end = self.expect(TokenKind::RParen)?.span;
            let span = self.arena.expr(callee).span.merge(end);
            let args = self.arena.alloc_expr_list(args);
            callee = self.alloc(ExprKind::Call { callee, args }, span);
        }
        Ok(callee)
    }

    fn parse_primary(&mut self) -> ParseResult<ExprId> {
        let token = *self.current();
        let kind = match token.kind {
            TokenKind::Number(bits) => ExprKind::Number(bits),
            TokenKind::String(name) => ExprKind::String(name),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Undefined => ExprKind::Undefined,
            TokenKind::Ident(name) => ExprKind::Ident(self.scope.add_reference(name, token.span)),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                return Ok(inner);
            }
            _ => {
                return Err(expected_expression(token.span, self.describe_current()).into());
            }
        };
        self.advance();
        Ok(self.alloc(kind, token.span))
    }

    fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.arena.alloc_expr(Expr::new(kind, span))
    }

    fn assignment_target(&self, expr: ExprId) -> ParseResult<RefId> {
        self.identifier_target(expr, "Invalid left-hand side in assignment")
    }

    fn update_target(&self, expr: ExprId) -> ParseResult<RefId> {
        self.identifier_target(
            expr,
            "Invalid left-hand side expression in update operation",
        )
    }

    fn identifier_target(&self, expr: ExprId, message: &str) -> ParseResult<RefId> {
        let expr = self.arena.expr(expr);
        match expr.kind {
            ExprKind::Ident(reference) => Ok(reference),
            _ => Err(Diagnostic::error(ErrorCode::E1005)
                .with_message(message)
                .with_label(expr.span, "only variables can be assigned")
                .into()),
        }
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::BangEq => BinaryOp::NotEq,
        TokenKind::EqEqEq => BinaryOp::StrictEq,
        TokenKind::BangEqEq => BinaryOp::StrictNotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        _ => return None,
    })
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::Add,
        TokenKind::MinusEq => AssignOp::Sub,
        TokenKind::StarEq => AssignOp::Mul,
        TokenKind::SlashEq => AssignOp::Div,
        TokenKind::PercentEq => AssignOp::Mod,
        _ => return None,
    })
}

fn update_op(kind: TokenKind) -> UpdateOp {
    if kind == TokenKind::MinusMinus {
        UpdateOp::Decrement
    } else {
        UpdateOp::Increment
    }
}

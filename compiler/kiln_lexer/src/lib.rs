//! Lexer for Kiln compilation units.
//!
//! Converts the source text of one function unit into a [`TokenList`].
//! Identifiers and string literals are interned into the caller's
//! [`StringInterner`]. Spans are absolute: the caller passes the byte offset
//! at which the unit starts in its script.
//!
//! Lexing stops at the first malformed token; the returned diagnostic is a
//! syntax error.

mod cursor;
mod literals;

use kiln_diagnostic::{Diagnostic, ErrorCode};
use kiln_ir::{Span, StringInterner, Token, TokenKind, TokenList};

use cursor::Cursor;

/// Lex `source`, whose first byte is at offset `base` of the script.
pub fn lex(
    source: &str,
    base: u32,
    interner: &mut StringInterner,
) -> Result<TokenList, Diagnostic> {
    let mut lexer = Lexer {
        cursor: Cursor::new(source, base),
        interner,
    };
    let mut tokens = TokenList::with_capacity(source.len() / 3 + 1);
    loop {
        let token = lexer.next_token()?;
        let at_end = token.kind == TokenKind::Eof;
        tokens.push(token);
        if at_end {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a, 'i> {
    cursor: Cursor<'a>,
    interner: &'i mut StringInterner,
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

#[inline]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

impl Lexer<'_, '_> {
    fn span(&self, start: usize) -> Span {
        Span::new(self.cursor.offset(start), self.cursor.offset(self.cursor.pos()))
    }

    fn next_token(&mut self) -> Result<Token, Diagnostic> {
        self.skip_trivia()?;
        let start = self.cursor.pos();
        let Some(b) = self.cursor.current() else {
            return Ok(Token::new(TokenKind::Eof, self.span(start)));
        };

        let kind = match b {
            b'0'..=b'9' => self.number(start)?,
            b'.' if self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number(start)?
            }
            b'\'' | b'"' => self.string(start, b)?,
            _ if is_ident_start(b) => self.word(start),
            _ if !b.is_ascii() && self.cursor.current_char().is_some_and(char::is_alphabetic) => {
                self.word(start)
            }
            _ => self.punctuator(start)?,
        };
        Ok(Token::new(kind, self.span(start)))
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), Diagnostic> {
        loop {
            match (self.cursor.current(), self.cursor.peek()) {
                (Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c), _) => self.cursor.advance(1),
                (Some(b'/'), Some(b'/')) => {
                    let rest = self.cursor.rest();
                    let len = memchr::memchr(b'\n', rest).unwrap_or(rest.len());
                    self.cursor.advance(len);
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.cursor.pos();
                    self.cursor.advance(2);
                    match memchr::memmem::find(self.cursor.rest(), b"*/") {
                        Some(len) => self.cursor.advance(len + 2),
                        None => {
                            self.cursor.advance(self.cursor.rest().len());
                            return Err(Diagnostic::error(ErrorCode::E0004)
                                .with_message("Unterminated block comment")
                                .with_label(self.span(start), "comment starts here"));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn word(&mut self, start: usize) -> TokenKind {
        loop {
            match self.cursor.current() {
                Some(b) if is_ident_continue(b) => self.cursor.advance(1),
                Some(b) if !b.is_ascii() => match self.cursor.current_char() {
                    Some(c) if c.is_alphanumeric() => self.cursor.advance(c.len_utf8()),
                    _ => break,
                },
                _ => break,
            }
        }
        let text = self.cursor.slice(start, self.cursor.pos());
        TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Ident(self.interner.intern(text)))
    }

    fn punctuator(&mut self, start: usize) -> Result<TokenKind, Diagnostic> {
        let b = self.cursor.current().unwrap_or(0);
        let next = self.cursor.peek();
        let third = self.cursor.peek_at(2);

        let (kind, len) = match (b, next, third) {
            (b'(', ..) => (TokenKind::LParen, 1),
            (b')', ..) => (TokenKind::RParen, 1),
            (b'{', ..) => (TokenKind::LBrace, 1),
            (b'}', ..) => (TokenKind::RBrace, 1),
            (b',', ..) => (TokenKind::Comma, 1),
            (b';', ..) => (TokenKind::Semicolon, 1),
            (b'?', ..) => (TokenKind::Question, 1),
            (b':', ..) => (TokenKind::Colon, 1),
            (b'+', Some(b'+'), _) => (TokenKind::PlusPlus, 2),
            (b'+', Some(b'='), _) => (TokenKind::PlusEq, 2),
            (b'+', ..) => (TokenKind::Plus, 1),
            (b'-', Some(b'-'), _) => (TokenKind::MinusMinus, 2),
            (b'-', Some(b'='), _) => (TokenKind::MinusEq, 2),
            (b'-', ..) => (TokenKind::Minus, 1),
            (b'*', Some(b'='), _) => (TokenKind::StarEq, 2),
            (b'*', ..) => (TokenKind::Star, 1),
            (b'/', Some(b'='), _) => (TokenKind::SlashEq, 2),
            (b'/', ..) => (TokenKind::Slash, 1),
            (b'%', Some(b'='), _) => (TokenKind::PercentEq, 2),
            (b'%', ..) => (TokenKind::Percent, 1),
            (b'=', Some(b'='), Some(b'=')) => (TokenKind::EqEqEq, 3),
            (b'=', Some(b'='), _) => (TokenKind::EqEq, 2),
            (b'=', ..) => (TokenKind::Eq, 1),
            (b'!', Some(b'='), Some(b'=')) => (TokenKind::BangEqEq, 3),
            (b'!', Some(b'='), _) => (TokenKind::BangEq, 2),
            (b'!', ..) => (TokenKind::Bang, 1),
            (b'<', Some(b'='), _) => (TokenKind::LtEq, 2),
            (b'<', ..) => (TokenKind::Lt, 1),
            (b'>', Some(b'='), _) => (TokenKind::GtEq, 2),
            (b'>', ..) => (TokenKind::Gt, 1),
            (b'&', Some(b'&'), _) => (TokenKind::AmpAmp, 2),
            (b'|', Some(b'|'), _) => (TokenKind::PipePipe, 2),
            _ => {
                let found = self.cursor.current_char().unwrap_or('\u{fffd}');
                self.cursor.advance(found.len_utf8());
                return Err(Diagnostic::error(ErrorCode::E0002)
                    .with_message(format!("Invalid or unexpected token '{found}'"))
                    .with_label(self.span(start), "not valid here"));
            }
        };
        self.cursor.advance(len);
        Ok(kind)
    }
}

#[cfg(test)]
mod tests;

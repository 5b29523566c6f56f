//! Number and string literals.

use kiln_diagnostic::{Diagnostic, ErrorCode};
use kiln_ir::TokenKind;

use crate::Lexer;

#[expect(
    clippy::cast_precision_loss,
    reason = "hex literals above 2^53 round like any other number literal"
)]
fn u64_to_f64(value: u64) -> f64 {
    value as f64
}

impl Lexer<'_, '_> {
    pub(crate) fn number(&mut self, start: usize) -> Result<TokenKind, Diagnostic> {
        if self.cursor.current() == Some(b'0')
            && matches!(self.cursor.peek(), Some(b'x' | b'X'))
        {
            self.cursor.advance(2);
            let digits_start = self.cursor.pos();
            self.cursor.eat_while(|b| b.is_ascii_hexdigit());
            let digits = self.cursor.slice(digits_start, self.cursor.pos());
            let value = u64::from_str_radix(digits, 16)
                .ok()
                .filter(|_| !self.ident_follows());
            return match value {
                Some(value) => Ok(TokenKind::Number(u64_to_f64(value).to_bits())),
                None => Err(self.invalid_number(start)),
            };
        }

        self.cursor.eat_while(|b| b.is_ascii_digit());
        if self.cursor.current() == Some(b'.') {
            self.cursor.advance(1);
            self.cursor.eat_while(|b| b.is_ascii_digit());
        }
        if matches!(self.cursor.current(), Some(b'e' | b'E')) {
            self.cursor.advance(1);
            if matches!(self.cursor.current(), Some(b'+' | b'-')) {
                self.cursor.advance(1);
            }
            if !self.cursor.current().is_some_and(|b| b.is_ascii_digit()) {
                return Err(self.invalid_number(start));
            }
            self.cursor.eat_while(|b| b.is_ascii_digit());
        }
        if self.ident_follows() {
            return Err(self.invalid_number(start));
        }

        let text = self.cursor.slice(start, self.cursor.pos());
        text.parse::<f64>()
            .map(|value| TokenKind::Number(value.to_bits()))
            .map_err(|_| self.invalid_number(start))
    }

    /// `3in`, `0x1g`: a number may not run into an identifier.
    fn ident_follows(&self) -> bool {
        self.cursor
            .current()
            .is_some_and(|b| crate::is_ident_start(b) || b.is_ascii_digit())
    }

    fn invalid_number(&mut self, start: usize) -> Diagnostic {
        self.cursor.eat_while(crate::is_ident_continue);
        Diagnostic::error(ErrorCode::E0003)
            .with_message("Invalid or unexpected token")
            .with_label(self.span(start), "invalid number literal")
    }

    pub(crate) fn string(&mut self, start: usize, quote: u8) -> Result<TokenKind, Diagnostic> {
        self.cursor.advance(1);
        let mut cooked = String::new();
        loop {
            let rest = self.cursor.rest();
            let Some(stop) = memchr::memchr3(quote, b'\\', b'\n', rest) else {
                self.cursor.advance(rest.len());
                return Err(self.unterminated_string(start));
            };
            let chunk_start = self.cursor.pos();
            self.cursor.advance(stop);
            cooked.push_str(self.cursor.slice(chunk_start, self.cursor.pos()));

            match self.cursor.current() {
                Some(b'\\') => {
                    let escape_start = self.cursor.pos();
                    self.cursor.advance(1);
                    let c = self.escape(escape_start)?;
                    cooked.push(c);
                }
                Some(b'\n') | None => return Err(self.unterminated_string(start)),
                Some(_) => {
                    self.cursor.advance(1);
                    return Ok(TokenKind::String(self.interner.intern(&cooked)));
                }
            }
        }
    }

    fn unterminated_string(&self, start: usize) -> Diagnostic {
        Diagnostic::error(ErrorCode::E0001)
            .with_message("Invalid or unexpected token")
            .with_label(self.span(start), "unterminated string literal")
    }

    /// Cook one escape; the cursor is just past the backslash.
    fn escape(&mut self, escape_start: usize) -> Result<char, Diagnostic> {
        let Some(c) = self.cursor.current_char() else {
            return Err(self.invalid_escape(escape_start));
        };
        self.cursor.advance(c.len_utf8());
        let cooked = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' if !self.cursor.current().is_some_and(|b| b.is_ascii_digit()) => '\0',
            'x' => self.hex_escape(escape_start, 2)?,
            'u' => self.hex_escape(escape_start, 4)?,
            '\n' => return Err(self.invalid_escape(escape_start)),
            c if c.is_ascii_digit() => return Err(self.invalid_escape(escape_start)),
            c => c,
        };
        Ok(cooked)
    }

    fn hex_escape(&mut self, escape_start: usize, digits: usize) -> Result<char, Diagnostic> {
        let start = self.cursor.pos();
        let end = start + digits;
        let valid = (0..digits).all(|i| {
            self.cursor
                .peek_at(i)
                .is_some_and(|b| b.is_ascii_hexdigit())
        });
        if !valid {
            return Err(self.invalid_escape(escape_start));
        }
        self.cursor.advance(digits);
        u32::from_str_radix(self.cursor.slice(start, end), 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.invalid_escape(escape_start))
    }

    fn invalid_escape(&self, escape_start: usize) -> Diagnostic {
        Diagnostic::error(ErrorCode::E0005)
            .with_message("Invalid escape sequence")
            .with_label(self.span(escape_start), "invalid escape")
    }
}

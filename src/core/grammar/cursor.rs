use super::AddressError;

/// Byte cursor over an ASCII address string.
pub(super) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(super) fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub(super) fn position(&self) -> usize {
        self.pos
    }

    pub(super) fn skip(&mut self, len: usize) {
        self.pos = (self.pos + len).min(self.text.len());
    }

    pub(super) fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub(super) fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    pub(super) fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    pub(super) fn peek_is(&self, pred: impl Fn(u8) -> bool) -> bool {
        self.peek().map(pred).unwrap_or(false)
    }

    pub(super) fn bump(&mut self) {
        self.skip(1);
    }

    pub(super) fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(super) fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), AddressError> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    pub(super) fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub(super) fn expect_end(&self) -> Result<(), AddressError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("end of address"))
        }
    }

    pub(super) fn slice(&self, start: usize) -> &'a str {
        &self.text[start..self.pos]
    }

    pub(super) fn error(&self, expected: &'static str) -> AddressError {
        AddressError::Syntax {
            position: self.pos,
            expected,
        }
    }

    /// Unsigned decimal of `1..=max_digits` digits, rejected above `max`.
    pub(super) fn number(&mut self, max_digits: usize, max: u32) -> Result<u32, AddressError> {
        let start = self.pos;
        let mut value: u64 = 0;
        let mut digits = 0usize;
        while let Some(byte) = self.peek().filter(u8::is_ascii_digit) {
            if digits == max_digits {
                return Err(self.error("fewer digits"));
            }
            value = value
                .saturating_mul(10)
                .saturating_add(u64::from(byte - b'0'));
            digits += 1;
            self.bump();
        }
        if digits == 0 {
            return Err(self.error("decimal number"));
        }
        if value > u64::from(max) {
            return Err(AddressError::IndexOutOfRange {
                position: start,
                max,
            });
        }
        Ok(value as u32)
    }
}

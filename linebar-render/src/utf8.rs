//! Streaming UTF-8 decoder.
//!
//! Bytes are fed one at a time. The decoder accepts exactly the
//! well-formed sequences of Unicode table 3-7 and rejects overlong forms,
//! surrogates and anything above U+10FFFF. A rejected sequence moves it to a
//! sink state, so everything after the first error is ignored and only the
//! valid prefix of a line is decoded.

/// Result of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A complete code point was decoded.
    Char(char),
    /// More continuation bytes are needed.
    Incomplete,
    /// The input is malformed; the decoder is now in its reject state.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Accept,
    /// Waiting for `remaining` continuation bytes; the next one must lie in
    /// `lower..=upper`, later ones in `0x80..=0xBF`.
    Continue {
        remaining: u8,
        code_point: u32,
        lower: u8,
        upper: u8,
    },
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf8Decoder {
    state: State,
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self {
            state: State::Accept,
        }
    }

    /// True between code points, i.e. not inside a sequence and not rejected.
    pub fn is_accept(&self) -> bool {
        self.state == State::Accept
    }

    pub fn is_rejected(&self) -> bool {
        self.state == State::Reject
    }

    /// Feed one byte.
    pub fn push(&mut self, byte: u8) -> Step {
        match self.state {
            State::Reject => Step::Reject,
            State::Accept => self.lead(byte),
            State::Continue {
                remaining,
                code_point,
                lower,
                upper,
            } => {
                if !(lower..=upper).contains(&byte) {
                    return self.reject();
                }
                let code_point = (code_point << 6) | (byte & 0x3F) as u32;
                if remaining == 1 {
                    self.state = State::Accept;
                    match char::from_u32(code_point) {
                        Some(ch) => Step::Char(ch),
                        None => self.reject(),
                    }
                } else {
                    self.state = State::Continue {
                        remaining: remaining - 1,
                        code_point,
                        lower: 0x80,
                        upper: 0xBF,
                    };
                    Step::Incomplete
                }
            }
        }
    }

    fn lead(&mut self, byte: u8) -> Step {
        let (remaining, code_point, lower, upper) = match byte {
            0x00..=0x7F => return Step::Char(byte as char),
            0xC2..=0xDF => (1, byte & 0x1F, 0x80, 0xBF),
            0xE0 => (2, byte & 0x0F, 0xA0, 0xBF),
            0xE1..=0xEC | 0xEE..=0xEF => (2, byte & 0x0F, 0x80, 0xBF),
            0xED => (2, byte & 0x0F, 0x80, 0x9F),
            0xF0 => (3, byte & 0x07, 0x90, 0xBF),
            0xF1..=0xF3 => (3, byte & 0x07, 0x80, 0xBF),
            0xF4 => (3, byte & 0x07, 0x80, 0x8F),
            _ => return self.reject(),
        };
        self.state = State::Continue {
            remaining,
            code_point: code_point as u32,
            lower,
            upper,
        };
        Step::Incomplete
    }

    fn reject(&mut self) -> Step {
        self.state = State::Reject;
        Step::Reject
    }
}

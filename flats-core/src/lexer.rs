//! Character cursor over a schema source. Whitespace and comments are
//! skipped as one unit; the current line number is tracked for
//! diagnostics. Put-back is realized as a non-consuming peek.

use crate::error::CoreError;

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// A lex error at the current line.
    pub fn error(&self, message: impl Into<String>) -> CoreError {
        CoreError::Lex {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek_raw(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump_raw(&mut self) -> Option<char> {
        let ch = self.peek_raw()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    /// Skip whitespace, `// …` line comments, and non-nesting
    /// `/* … */` block comments (the first `*/` closes).
    pub fn skip_ws_and_comments(&mut self) -> Result<(), CoreError> {
        loop {
            match self.peek_raw() {
                Some(c) if c.is_whitespace() => {
                    self.bump_raw();
                }
                Some('/') if self.chars.get(self.pos + 1) == Some(&'/') => {
                    while let Some(c) = self.bump_raw() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.chars.get(self.pos + 1) == Some(&'*') => {
                    self.bump_raw();
                    self.bump_raw();
                    let mut closed = false;
                    while let Some(c) = self.bump_raw() {
                        if c == '*' && self.peek_raw() == Some('/') {
                            self.bump_raw();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(self.error("unterminated block comment"));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// True when only whitespace and comments remain.
    pub fn at_end(&mut self) -> Result<bool, CoreError> {
        self.skip_ws_and_comments()?;
        Ok(self.peek_raw().is_none())
    }

    /// Next significant character without consuming it.
    pub fn peek_char(&mut self) -> Result<char, CoreError> {
        self.skip_ws_and_comments()?;
        self.peek_raw()
            .ok_or_else(|| self.error("unexpected end of input"))
    }

    /// Consume and return the next significant character.
    pub fn consume_char(&mut self) -> Result<char, CoreError> {
        let ch = self.peek_char()?;
        self.bump_raw();
        Ok(ch)
    }

    /// Consume the next significant character when it is `c`. False at
    /// end of input.
    pub fn eat(&mut self, c: char) -> Result<bool, CoreError> {
        if self.at_end()? {
            return Ok(false);
        }
        if self.peek_raw() == Some(c) {
            self.bump_raw();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Require the next significant character to be `c`.
    pub fn expect_char(&mut self, c: char, context: &str) -> Result<(), CoreError> {
        let ch = self.consume_char()?;
        if ch == c {
            Ok(())
        } else {
            Err(CoreError::Parse {
                line: self.line,
                message: format!("'{c}' expected {context}"),
            })
        }
    }

    /// Consume one optional `;` or `,` terminator, if present.
    pub fn eat_terminator(&mut self) -> Result<(), CoreError> {
        if self.at_end()? {
            return Ok(());
        }
        if matches!(self.peek_raw(), Some(';') | Some(',')) {
            self.bump_raw();
        }
        Ok(())
    }

    /// A name: a letter or underscore followed by letters, digits, and
    /// underscores.
    pub fn read_name(&mut self) -> Result<String, CoreError> {
        let first = self.consume_char()?;
        if !is_name_start(first) {
            return Err(self.error(format!(
                "letter or underscore expected in name, found '{first}'"
            )));
        }
        let mut name = String::new();
        name.push(first);
        while let Some(c) = self.peek_raw() {
            if is_name_continue(c) {
                name.push(c);
                self.bump_raw();
            } else {
                break;
            }
        }
        Ok(name)
    }

    /// A bare decimal literal. Qualified enumerators are resolved a
    /// level up, where the symbol table is in reach.
    pub fn read_number(&mut self) -> Result<i32, CoreError> {
        let first = self.consume_char()?;
        if !first.is_ascii_digit() {
            return Err(self.error("number expected"));
        }
        let mut digits = String::new();
        digits.push(first);
        while let Some(c) = self.peek_raw() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump_raw();
            } else {
                break;
            }
        }
        digits
            .parse()
            .map_err(|_| self.error(format!("invalid integer literal '{digits}'")))
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

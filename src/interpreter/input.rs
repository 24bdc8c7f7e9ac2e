use std::{collections::VecDeque, io::BufRead};

use crate::errors::errors::{Error, ErrorImpl};

/// Whitespace-separated token source behind `read`/`readln`.
pub struct TokenReader<'io> {
    input: &'io mut dyn BufRead,
    tokens: VecDeque<String>,
    /// A line has been started and not yet skipped.
    in_line: bool,
}

impl<'io> TokenReader<'io> {
    pub fn new(input: &'io mut dyn BufRead) -> Self {
        TokenReader {
            input,
            tokens: VecDeque::new(),
            in_line: false,
        }
    }

    fn read_line(&mut self, line: u32) -> Result<bool, Error> {
        let mut text = String::new();
        let read = self.input.read_line(&mut text).map_err(|error| {
            Error::new(
                ErrorImpl::InvalidInput {
                    token: error.to_string(),
                },
                line,
            )
        })?;
        if read == 0 {
            return Ok(false);
        }

        self.tokens
            .extend(text.split_whitespace().map(str::to_string));
        self.in_line = true;
        Ok(true)
    }

    /// Next token, reading further lines as needed.
    pub fn next_token(&mut self, line: u32) -> Result<String, Error> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return Ok(token);
            }
            if !self.read_line(line)? {
                return Err(Error::new(
                    ErrorImpl::InvalidInput {
                        token: "<end of input>".to_string(),
                    },
                    line,
                ));
            }
        }
    }

    /// Discards the rest of the current line, or the next line when none
    /// has been started.
    pub fn skip_line(&mut self, line: u32) -> Result<(), Error> {
        if !self.in_line {
            self.read_line(line)?;
        }
        self.tokens.clear();
        self.in_line = false;
        Ok(())
    }

    pub fn read_integer(&mut self, line: u32) -> Result<i32, Error> {
        let token = self.next_token(line)?;
        match token.parse() {
            Ok(value) => Ok(value),
            Err(_) => Err(Error::new(ErrorImpl::InvalidInput { token }, line)),
        }
    }

    pub fn read_real(&mut self, line: u32) -> Result<f64, Error> {
        let token = self.next_token(line)?;
        match token.parse() {
            Ok(value) => Ok(value),
            Err(_) => Err(Error::new(ErrorImpl::InvalidInput { token }, line)),
        }
    }

    pub fn read_boolean(&mut self, line: u32) -> Result<bool, Error> {
        let token = self.next_token(line)?;
        match token.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Error::new(ErrorImpl::InvalidInput { token }, line)),
        }
    }

    /// Next non-blank character. The rest of its token stays pending.
    pub fn read_char(&mut self, line: u32) -> Result<char, Error> {
        let token = self.next_token(line)?;
        let mut chars = token.chars();
        let Some(value) = chars.next() else {
            return Err(Error::new(ErrorImpl::InvalidInput { token }, line));
        };
        let rest = chars.as_str();
        if !rest.is_empty() {
            self.tokens.push_front(rest.to_string());
        }
        Ok(value)
    }

    pub fn read_string(&mut self, line: u32) -> Result<String, Error> {
        self.next_token(line)
    }
}

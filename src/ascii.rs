//! The character-stream convention layered on top of plain integer I/O.
//!
//! Output values in `0..=127` are ASCII characters and 10 ends a line. Text
//! input is queued one character code at a time followed by 10.

use std::fmt;

use crate::error::{Result, VmError};
use crate::machine::{Machine, Signal};

const NEWLINE: i64 = 10;

/// One unit of character-stream output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Text up to (not including) a newline, or up to halt.
    Line(String),
    /// Text written without a newline right before the machine asked for input.
    Prompt(String),
    /// An output value outside the ASCII range, typically a final answer.
    Value(i64),
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Line(line) => writeln!(f, "{line}"),
            Chunk::Prompt(text) => write!(f, "{text}"),
            Chunk::Value(value) => writeln!(f, "{value}"),
        }
    }
}

impl Machine {
    /// Queue `line` as character input, followed by a newline.
    pub fn push_line(&mut self, line: &str) {
        self.extend_input(line.bytes().map(i64::from));
        self.push_input(NEWLINE);
    }

    /// Read the next line, prompt, or non-ASCII value.
    ///
    /// A non-ASCII value that arrives in the middle of a line ends that line
    /// early; the value itself is returned by the following call. Text
    /// pending when the machine asks for input comes back as a
    /// [`Chunk::Prompt`]; asking for input with nothing pending is an
    /// [`VmError::InputStarvation`], after which the machine can still be
    /// given input and read again. Returns `Ok(None)` once the machine has
    /// halted and nothing is left.
    pub fn read_line(&mut self) -> Result<Option<Chunk>> {
        if let Some(value) = self.held_output.take() {
            return Ok(Some(Chunk::Value(value)));
        }
        if self.is_halted() {
            return Ok(None);
        }
        let mut line = String::new();
        loop {
            match self.resume(None)? {
                Signal::Output(NEWLINE) => return Ok(Some(Chunk::Line(line))),
                Signal::Output(value @ 0..=127) => line.push(value as u8 as char),
                Signal::Output(value) if line.is_empty() => {
                    return Ok(Some(Chunk::Value(value)));
                }
                Signal::Output(value) => {
                    self.held_output = Some(value);
                    return Ok(Some(Chunk::Line(line)));
                }
                Signal::NeedsInput if line.is_empty() => {
                    return Err(VmError::InputStarvation { ip: self.ip() });
                }
                Signal::NeedsInput => return Ok(Some(Chunk::Prompt(line))),
                Signal::Halted if line.is_empty() => return Ok(None),
                Signal::Halted => return Ok(Some(Chunk::Line(line))),
            }
        }
    }

    /// Read chunks into `chunks` until the machine halts.
    ///
    /// Chunks read before an error stay in `chunks`.
    pub fn read_lines(&mut self, chunks: &mut Vec<Chunk>) -> Result<()> {
        while let Some(chunk) = self.read_line()? {
            chunks.push(chunk);
        }
        Ok(())
    }
}

/// Render chunks back into text. Lines and non-ASCII values each end with a
/// newline; prompts are written as-is.
pub fn render(chunks: &[Chunk]) -> String {
    chunks.iter().map(Chunk::to_string).collect()
}

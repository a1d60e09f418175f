//! Terminal output for the interactive chat.

use std::io::{self, Write};

/// Writes chat output to a pair of streams (normally stdout and stderr).
///
/// Every write is flushed so tokens appear as soon as they arrive.
pub struct Renderer<O: Write, E: Write> {
    out: O,
    err: E,
}

impl Renderer<io::Stdout, io::Stderr> {
    pub fn terminal() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Renderer<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "you> ")?;
        self.out.flush()
    }

    pub fn assistant_prefix(&mut self) -> io::Result<()> {
        write!(self.out, "assistant> ")?;
        self.out.flush()
    }

    pub fn token(&mut self, token: &str) -> io::Result<()> {
        write!(self.out, "{token}")?;
        self.out.flush()
    }

    pub fn plain(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    pub fn newline(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "[info] {message}")?;
        self.out.flush()
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.err, "Error: {message}")?;
        self.err.flush()
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

//! Text rendering for the print direction

use std::fmt::Write as _;
use std::io;

/// Octets of an OCTET STRING or ANY shown in a hex dump before truncating
pub const MAX_DUMP_OCTETS: usize = 64;

enum Sink {
    Buffer(String),
    Stream(Box<dyn io::Write + Send>),
}

/// Indentation-aware line writer
///
/// Lines are indented two spaces per level. Past level 16 the indentation
/// wraps and the line carries an explicit `level=N` marker instead, which
/// keeps deeply nested dumps readable.
pub(crate) struct Printer {
    indent: usize,
    sink: Sink,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            indent: 0,
            sink: Sink::Buffer(String::new()),
        }
    }

    pub fn set_stream(&mut self, stream: Box<dyn io::Write + Send>) {
        self.sink = Sink::Stream(stream);
    }

    /// Text printed so far when printing to the internal buffer
    pub fn output(&self) -> &str {
        match &self.sink {
            Sink::Buffer(text) => text,
            Sink::Stream(_) => "",
        }
    }

    pub fn take_output(&mut self) -> String {
        match &mut self.sink {
            Sink::Buffer(text) => std::mem::take(text),
            Sink::Stream(_) => String::new(),
        }
    }

    /// Drop buffered text and indentation; a stream sink stays installed
    pub fn reset(&mut self) {
        self.indent = 0;
        if let Sink::Buffer(text) = &mut self.sink {
            text.clear();
        }
    }

    /// Print `name value` on its own line
    pub fn line(&mut self, name: &str, value: &str) -> io::Result<()> {
        let mut text = self.prefix(name);
        text.push_str(value);
        text.push('\n');
        self.emit(&text)
    }

    /// Print `name {` and indent following lines
    pub fn open(&mut self, name: &str) -> io::Result<()> {
        let mut text = self.prefix(name);
        text.push_str("{\n");
        self.indent += 1;
        self.emit(&text)
    }

    /// Dedent and print `}`
    pub fn close(&mut self) -> io::Result<()> {
        self.indent = self.indent.saturating_sub(1);
        let mut text = self.prefix("");
        text.push_str("}\n");
        self.emit(&text)
    }

    fn prefix(&self, name: &str) -> String {
        let mut text = String::new();
        if self.indent < 16 {
            text.push_str(&" ".repeat(self.indent * 2));
        } else {
            let _ = write!(text, "level={:<7}{}", self.indent, " ".repeat(2 * (self.indent % 8)));
        }
        if !name.is_empty() {
            text.push_str(name);
            text.push(' ');
        }
        text
    }

    fn emit(&mut self, text: &str) -> io::Result<()> {
        match &mut self.sink {
            Sink::Buffer(buffer) => {
                buffer.push_str(text);
                Ok(())
            }
            Sink::Stream(stream) => stream.write_all(text.as_bytes()),
        }
    }
}

impl std::fmt::Debug for Printer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Printer")
            .field("indent", &self.indent)
            .finish_non_exhaustive()
    }
}

/// Hex rendering of at most [`MAX_DUMP_OCTETS`] octets
pub(crate) fn hex_dump(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len().min(MAX_DUMP_OCTETS) * 3 + 4);
    for (i, byte) in bytes.iter().take(MAX_DUMP_OCTETS).enumerate() {
        if i > 0 {
            text.push(' ');
        }
        let _ = write!(text, "{:02X}", byte);
    }
    if bytes.len() > MAX_DUMP_OCTETS {
        text.push_str(" ...");
    }
    text
}

//! Line-oriented terminal I/O.

use std::io::{self, BufRead, Write};

/// Where the session reads user input and writes story text.
pub trait Console {
    /// Show `prompt` and read one line. Returns `None` once input is closed.
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Show a block of text followed by a newline.
    fn show(&mut self, text: &str);
}

/// Console over a line reader and a writer; stdin and stdout by default.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
/// stray byte never ends the session.
#[derive(Debug)]
pub struct StdConsole<R = io::StdinLock<'static>, W = io::Stdout> {
    reader: R,
    writer: W,
}

impl StdConsole {
    pub fn new() -> Self {
        Self::with_io(io::stdin().lock(), io::stdout())
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> StdConsole<R, W> {
    /// Console over any reader and writer.
    pub fn with_io(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Get the underlying writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<R: BufRead, W: Write> Console for StdConsole<R, W> {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        // Prompts stay on the input line.
        let _ = write!(self.writer, "{prompt} ");
        let _ = self.writer.flush();

        let mut line = Vec::new();
        loop {
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => return None,
                Ok(_) => break,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    tracing::error!(%error, "failed to read from stdin");
                    return None;
                }
            }
        }

        let line = String::from_utf8_lossy(&line);
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn show(&mut self, text: &str) {
        let _ = writeln!(self.writer, "{text}");
    }
}

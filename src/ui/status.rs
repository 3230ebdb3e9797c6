//! Status screen composition for the local display.
//!
//! The screen is a header naming the device and its connection state,
//! followed by up to three body lines.  Rendering the text into pixels is
//! the sink's business.

use core::fmt::Write;

use crate::config::{DEVICE_NAME, DISPLAY_BODY_LINES, DISPLAY_COLUMNS};
use crate::connection::ConnectionState;

/// One display row, truncated to the panel width.
pub type Line = heapless::String<DISPLAY_COLUMNS>;

/// Receives human-readable status lines.
pub trait DisplaySink {
    /// Replace the whole screen with `lines` (header first).
    fn show(&mut self, lines: &[&str]);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusScreen {
    header: Line,
    body: heapless::Vec<Line, DISPLAY_BODY_LINES>,
}

impl StatusScreen {
    pub fn new(state: ConnectionState) -> Self {
        let mut header = Line::new();
        push_truncated(&mut header, DEVICE_NAME);
        push_truncated(&mut header, " ");
        push_truncated(&mut header, state.label());
        Self {
            header,
            body: heapless::Vec::new(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Append a body line; lines past the third are dropped.
    pub fn push(&mut self, line: Line) -> &mut Self {
        let _ = self.body.push(line);
        self
    }

    /// Header followed by the body lines.
    pub fn lines(&self) -> heapless::Vec<&str, { DISPLAY_BODY_LINES + 1 }> {
        let mut out = heapless::Vec::new();
        let _ = out.push(self.header.as_str());
        for line in &self.body {
            let _ = out.push(line.as_str());
        }
        out
    }

    pub fn show_on<D: DisplaySink + ?Sized>(&self, sink: &mut D) {
        sink.show(&self.lines());
    }
}

/// Build a line from a text label.
pub fn text_line(text: &str) -> Line {
    let mut line = Line::new();
    push_truncated(&mut line, text);
    line
}

/// Build `"<prefix><payload>"`, rendering non-printable payload bytes as `.`.
pub fn payload_line(prefix: &str, payload: &[u8]) -> Line {
    let mut line = text_line(prefix);
    for &b in payload {
        let c = if b.is_ascii_graphic() || b == b' ' {
            b as char
        } else {
            '.'
        };
        if line.push(c).is_err() {
            break;
        }
    }
    line
}

/// Build `"<prefix><n>"`.
pub fn counter_line(prefix: &str, n: u32) -> Line {
    let mut line = text_line(prefix);
    let _ = write!(line, "{}", n);
    line
}

fn push_truncated(line: &mut Line, text: &str) {
    for c in text.chars() {
        if line.push(c).is_err() {
            break;
        }
    }
}

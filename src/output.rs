//! Destination of `print` statements.
//!
//! - `Stdout`: one unbuffered line per print (default).
//! - `Buffer`: captured in memory for tests and embedding hosts.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Print sink using enum dispatch; the set of destinations is closed.
#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    Buffer(Rc<RefCell<String>>),
}

impl Output {
    /// A buffered sink plus a handle for reading what was printed.
    pub fn buffer() -> (Self, Rc<RefCell<String>>) {
        let buffer = Rc::new(RefCell::new(String::new()));
        (Output::Buffer(Rc::clone(&buffer)), buffer)
    }

    /// Writes `text` followed by a newline.
    pub fn println(&self, text: &str) -> io::Result<()> {
        match self {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", text)?;
                stdout.flush()
            }

            Output::Buffer(buffer) => {
                let mut buf = buffer.borrow_mut();
                buf.push_str(text);
                buf.push('\n');
                Ok(())
            }
        }
    }
}

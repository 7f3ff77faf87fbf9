use std::{
    collections::VecDeque,
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    sync::Arc,
};

use parking_lot::Mutex;

/// Removes terminal escape sequences so the log file stays plain text.
pub fn strip_ansi_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for esc in chars.by_ref() {
                if esc.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Append-only log file that keeps roughly the last `max_lines` lines.
///
/// Lines are counted as they are written; once the file has grown by a
/// tenth of the limit (at least 50 lines) it is rewritten with only its tail.
#[derive(Clone)]
pub struct CircularFileWriter {
    path: String,
    max_lines: usize,
    pending: Arc<Mutex<usize>>,
}

impl CircularFileWriter {
    pub fn new(path: String, max_lines: usize) -> Self {
        Self {
            path,
            max_lines: max_lines.max(1),
            pending: Arc::new(Mutex::new(0)),
        }
    }

    fn truncate_to_tail(&self) -> io::Result<()> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let mut tail: VecDeque<String> = VecDeque::with_capacity(self.max_lines + 1);
        for line in BufReader::new(file).lines() {
            tail.push_back(line?);
            if tail.len() > self.max_lines {
                tail.pop_front();
            }
        }

        let mut file = File::create(&self.path)?;
        for line in tail {
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

impl Write for CircularFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut pending = self.pending.lock();

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(buf)?;

        *pending += buf.iter().filter(|&&b| b == b'\n').count();
        if *pending >= (self.max_lines / 10).max(50) {
            if let Err(e) = self.truncate_to_tail() {
                eprintln!("Failed to prune log file {}: {}", self.path, e);
            }
            *pending = 0;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CircularFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

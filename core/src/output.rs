//! Line-splitting output adapter.
//!
//! Function drivers produce byte streams; consumers usually want complete
//! lines. [`LineWriter`] sits between the two: it forwards every write to
//! an optional inner writer untouched, and hands each complete line
//! (including its `\n`) to a handler, buffering partial lines across
//! writes.

use std::io::{self, Write};

/// An `io::Write` that invokes a handler once per complete output line.
///
/// Call [`LineWriter::close`] when the stream ends to flush a trailing
/// partial line to the handler.
pub struct LineWriter<W: Write, F: FnMut(&[u8])> {
    inner: Option<W>,
    handler: F,
    buffer: Vec<u8>,
}

impl<W: Write, F: FnMut(&[u8])> LineWriter<W, F> {
    pub fn new(inner: Option<W>, handler: F) -> Self {
        Self {
            inner,
            handler,
            buffer: Vec::new(),
        }
    }

    /// Flush any buffered partial line to the handler.
    pub fn close(&mut self) {
        if !self.buffer.is_empty() {
            (self.handler)(&self.buffer);
            self.buffer.clear();
        }
    }
}

impl<W: Write, F: FnMut(&[u8])> Write for LineWriter<W, F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        while start < buf.len() {
            match buf[start..].iter().position(|&b| b == b'\n') {
                Some(end) => {
                    let line = &buf[start..start + end + 1];
                    if self.buffer.is_empty() {
                        (self.handler)(line);
                    } else {
                        self.buffer.extend_from_slice(line);
                        let complete = std::mem::take(&mut self.buffer);
                        (self.handler)(&complete);
                    }
                    start += end + 1;
                }
                None => {
                    self.buffer.extend_from_slice(&buf[start..]);
                    break;
                }
            }
        }
        match self.inner.as_mut() {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Build a line handler that splits each line on whitespace, projects the
/// requested column indexes (empty string for missing columns), and pushes
/// the row into `values`. Rows failing `filter` are dropped.
pub fn column_handler<'a>(
    values: &'a mut Vec<Vec<String>>,
    cols: &'a [usize],
    filter: Option<fn(&[String]) -> bool>,
) -> impl FnMut(&[u8]) + 'a {
    move |line: &[u8]| {
        let text = String::from_utf8_lossy(line);
        let fields: Vec<&str> = text.split_whitespace().collect();
        let row: Vec<String> = cols
            .iter()
            .map(|&col| fields.get(col).map(|s| s.to_string()).unwrap_or_default())
            .collect();
        if filter.map_or(true, |keep| keep(&row)) {
            values.push(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_lines_across_partial_writes() {
        let mut lines: Vec<String> = Vec::new();
        {
            let mut w = LineWriter::new(None::<io::Sink>, |line: &[u8]| {
                lines.push(String::from_utf8_lossy(line).into_owned());
            });
            w.write_all(b"hel").unwrap();
            w.write_all(b"lo\nwor").unwrap();
            w.write_all(b"ld\ntail").unwrap();
            w.close();
        }
        assert_eq!(lines, vec!["hello\n", "world\n", "tail"]);
    }

    #[test]
    fn forwards_bytes_to_inner_writer() {
        let mut sink = Vec::new();
        let mut count = 0;
        {
            let mut w = LineWriter::new(Some(&mut sink), |_line: &[u8]| count += 1);
            w.write_all(b"a\nb\n").unwrap();
            w.close();
        }
        assert_eq!(sink, b"a\nb\n");
        assert_eq!(count, 2);
    }

    #[test]
    fn column_handler_projects_and_filters() {
        let mut rows = Vec::new();
        {
            let cols = [0, 2];
            let mut handler = column_handler(
                &mut rows,
                &cols,
                Some(|row: &[String]| !row[0].starts_with('#')),
            );
            handler(b"one two three\n");
            handler(b"# comment line\n");
            handler(b"short\n");
        }
        assert_eq!(
            rows,
            vec![
                vec!["one".to_string(), "three".to_string()],
                vec!["short".to_string(), String::new()],
            ]
        );
    }
}

//! Tail-follow engine: bounded backfill, then poll-driven streaming.
//!
//! The reader owns the only file cursor. Backfill scans the file once
//! through a fixed-capacity window so peak memory is O(window) rather
//! than O(file), then the cursor moves to end-of-file and the streaming
//! loop polls for appended lines. The shutdown flag is sampled at every
//! loop boundary and around the poll sleep; the line in flight always
//! completes before cancellation takes effect.

use log::debug;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{Result, TailError};
use crate::highlight::Highlighter;
use crate::render::SegmentSink;

/// Poll interval while waiting for appended data.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Keeps the most recent N lines pushed into it, evicting from the front.
#[derive(Debug)]
struct TailWindow {
    lines: VecDeque<String>,
    capacity: usize,
}

impl TailWindow {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    fn push(&mut self, line: String) {
        self.lines.push_back(line);
        if self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn into_lines(self) -> impl Iterator<Item = String> {
        self.lines.into_iter()
    }
}

/// Follows a single resolved file: emits a bounded window of history,
/// then streams appended lines until cancelled or a fatal read error.
///
/// The file handle is opened once and held for the whole session; a
/// rotated or truncated file is not re-discovered.
#[derive(Debug)]
pub struct TailReader {
    path: PathBuf,
    reader: BufReader<File>,
    backfill_lines: usize,
    shutdown: Arc<AtomicBool>,
}

impl TailReader {
    /// Open the resolved file for shared reading (writers may keep
    /// appending while we hold the handle).
    pub fn open(path: &Path, backfill_lines: usize, shutdown: Arc<AtomicBool>) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                TailError::not_found(format!("path not found: {}", path.display()))
            } else {
                TailError::io(format!("cannot open '{}'", path.display()), e)
            }
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            backfill_lines,
            shutdown,
        })
    }

    /// Backfill, reposition to end-of-file, then stream. Returns `Ok`
    /// on cancellation; any read failure is fatal and propagates.
    pub fn run(mut self, highlighter: &Highlighter, sink: &mut dyn SegmentSink) -> Result<()> {
        if self.backfill_lines > 0 {
            self.backfill(highlighter, sink)?;
        }
        self.reader
            .seek(SeekFrom::End(0))
            .map_err(|e| self.read_error(e))?;
        self.stream(highlighter, sink)
    }

    /// Read the whole file through a bounded window, then emit the
    /// retained lines in original order.
    fn backfill(&mut self, highlighter: &Highlighter, sink: &mut dyn SegmentSink) -> Result<()> {
        let mut window = TailWindow::new(self.backfill_lines);
        let mut buf = String::new();
        loop {
            buf.clear();
            let bytes = self
                .reader
                .read_line(&mut buf)
                .map_err(|e| self.read_error(e))?;
            if bytes == 0 {
                break;
            }
            window.push(trim_line_ending(&buf).to_string());
        }
        debug!(
            "backfill: emitting {} lines (window {})",
            window.len(),
            self.backfill_lines
        );
        for line in window.into_lines() {
            emit_line(&line, highlighter, sink)?;
        }
        Ok(())
    }

    /// Drain available lines as fast as they appear; when the cursor is
    /// at end-of-file, sleep one poll interval and retry. Bytes of a
    /// partially-written final line are held back until the terminating
    /// newline arrives.
    fn stream(&mut self, highlighter: &Highlighter, sink: &mut dyn SegmentSink) -> Result<()> {
        let mut pending = String::new();
        while !self.cancelled() {
            let mut chunk = String::new();
            let bytes = self
                .reader
                .read_line(&mut chunk)
                .map_err(|e| self.read_error(e))?;
            if bytes > 0 && chunk.ends_with('\n') {
                pending.push_str(&chunk);
                let line = trim_line_ending(&pending).to_string();
                pending.clear();
                emit_line(&line, highlighter, sink)?;
                continue;
            }

            // No complete line yet: either end-of-file, or a writer is
            // mid-line. Hold what we have and poll.
            pending.push_str(&chunk);
            if self.cancelled() {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
        debug!("shutdown flag set, stopping tail of {}", self.path.display());
        Ok(())
    }

    fn cancelled(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn read_error(&self, source: std::io::Error) -> TailError {
        TailError::io(format!("cannot read '{}'", self.path.display()), source)
    }
}

fn emit_line(line: &str, highlighter: &Highlighter, sink: &mut dyn SegmentSink) -> Result<()> {
    let segments = highlighter.highlight(line);
    sink.emit(&segments)
        .map_err(|e| TailError::io("cannot write rendered line".to_string(), e))
}

fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::Segment;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    /// Sink that records each emitted line, reconstructed from its
    /// segments.
    #[derive(Clone, Default)]
    struct CollectSink {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl CollectSink {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl SegmentSink for CollectSink {
        fn emit(&mut self, segments: &[Segment]) -> std::io::Result<()> {
            let line: String = segments.iter().map(|s| s.text.as_str()).collect();
            self.lines.lock().unwrap().push(line);
            Ok(())
        }
    }

    fn write_lines(path: &Path, lines: &[&str]) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
    }

    /// Run a reader with the shutdown flag pre-set: backfill happens,
    /// streaming exits on its first cancellation check.
    fn run_backfill_only(path: &Path, count: usize) -> Vec<String> {
        let shutdown = Arc::new(AtomicBool::new(true));
        let reader = TailReader::open(path, count, shutdown).unwrap();
        let highlighter = Highlighter::new();
        let mut sink = CollectSink::default();
        reader.run(&highlighter, &mut sink).unwrap();
        sink.lines()
    }

    /// Poll a collecting sink until it holds `expected` lines.
    fn wait_for_lines(sink: &CollectSink, expected: usize, max_attempts: u32) -> Vec<String> {
        for _ in 0..max_attempts {
            let lines = sink.lines();
            if lines.len() >= expected {
                return lines;
            }
            thread::sleep(Duration::from_millis(20));
        }
        sink.lines()
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = TailWindow::new(3);
        for i in 0..5 {
            window.push(format!("line {i}"));
        }
        let kept: Vec<String> = window.into_lines().collect();
        assert_eq!(kept, vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_window_minimum_capacity() {
        let mut window = TailWindow::new(0);
        window.push("a".to_string());
        window.push("b".to_string());
        assert_eq!(window.into_lines().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_backfill_emits_last_n_in_order() {
        let file = NamedTempFile::new().unwrap();
        write_lines(file.path(), &["one", "two", "three", "four", "five"]);

        let lines = run_backfill_only(file.path(), 3);
        assert_eq!(lines, vec!["three", "four", "five"]);
    }

    #[test]
    fn test_backfill_shorter_file_emits_everything() {
        let file = NamedTempFile::new().unwrap();
        write_lines(file.path(), &["only", "two"]);

        let lines = run_backfill_only(file.path(), 10);
        assert_eq!(lines, vec!["only", "two"]);
    }

    #[test]
    fn test_backfill_includes_unterminated_final_line() {
        let file = NamedTempFile::new().unwrap();
        write_lines(file.path(), &["done"]);
        let mut handle = OpenOptions::new().append(true).open(file.path()).unwrap();
        write!(handle, "partial").unwrap();
        handle.flush().unwrap();

        let lines = run_backfill_only(file.path(), 5);
        assert_eq!(lines, vec!["done", "partial"]);
    }

    #[test]
    fn test_open_missing_file_is_not_found() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let err = TailReader::open(Path::new("/no/such/file.log"), 5, shutdown).unwrap_err();
        assert!(matches!(err, TailError::NotFound(_)));
    }

    #[test]
    fn test_streaming_emits_appended_line() {
        let file = NamedTempFile::new().unwrap();
        write_lines(file.path(), &["old line"]);
        let path = file.path().to_path_buf();

        let shutdown = Arc::new(AtomicBool::new(false));
        let sink = CollectSink::default();

        let reader = TailReader::open(&path, 1, Arc::clone(&shutdown)).unwrap();
        let mut worker_sink = sink.clone();
        let worker = thread::spawn(move || {
            let highlighter = Highlighter::new();
            reader.run(&highlighter, &mut worker_sink)
        });

        // Backfill ("old line") lands first; give the reader time to
        // finish its end-of-file reposition before appending.
        wait_for_lines(&sink, 1, 50);
        thread::sleep(POLL_INTERVAL);
        write_lines(&path, &["hello"]);

        let lines = wait_for_lines(&sink, 2, 100);
        shutdown.store(true, Ordering::SeqCst);
        worker.join().unwrap().unwrap();

        assert_eq!(lines, vec!["old line", "hello"]);
    }

    #[test]
    fn test_streaming_holds_partial_line_until_newline() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let shutdown = Arc::new(AtomicBool::new(false));
        let sink = CollectSink::default();

        let reader = TailReader::open(&path, 0, Arc::clone(&shutdown)).unwrap();
        let mut worker_sink = sink.clone();
        let worker = thread::spawn(move || {
            let highlighter = Highlighter::new();
            reader.run(&highlighter, &mut worker_sink)
        });

        // Let the reader reach its streaming loop before writing, so the
        // partial bytes land after the end-of-file reposition.
        thread::sleep(POLL_INTERVAL);
        let mut handle = OpenOptions::new().append(true).open(&path).unwrap();
        write!(handle, "par").unwrap();
        handle.flush().unwrap();

        // Give the poll loop time to observe the incomplete line.
        thread::sleep(POLL_INTERVAL * 3);
        assert!(sink.lines().is_empty());

        writeln!(handle, "tial").unwrap();
        handle.flush().unwrap();

        let lines = wait_for_lines(&sink, 1, 100);
        shutdown.store(true, Ordering::SeqCst);
        worker.join().unwrap().unwrap();

        assert_eq!(lines, vec!["partial"]);
    }

    #[test]
    fn test_cancellation_stops_streaming() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let shutdown = Arc::new(AtomicBool::new(false));
        let reader = TailReader::open(&path, 0, Arc::clone(&shutdown)).unwrap();
        let worker = thread::spawn(move || {
            let highlighter = Highlighter::new();
            let mut sink = CollectSink::default();
            reader.run(&highlighter, &mut sink)
        });

        thread::sleep(Duration::from_millis(50));
        shutdown.store(true, Ordering::SeqCst);

        // The loop honors the flag within one poll interval.
        worker.join().unwrap().unwrap();
    }
}

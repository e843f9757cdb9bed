//! Prediction output sinks

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Handle given to the first opened prediction file; lower handles are the standard streams.
const FIRST_FILE_HANDLE: i32 = 3;
const STDOUT_HANDLE: i32 = 1;

struct PredictionSink {
    handle: i32,
    writer: Box<dyn Write>,
}

/// Ordered set of prediction destinations.
///
/// A handle that is not strictly positive marks a disabled sink: it keeps its
/// place in the set but never receives output.
#[derive(Default)]
pub struct PredictionSinks {
    sinks: Vec<PredictionSink>,
}

impl PredictionSinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: i32, writer: Box<dyn Write>) {
        self.sinks.push(PredictionSink { handle, writer });
    }

    /// Open one buffered sink per path. `-` and `/dev/stdout` write to stdout.
    pub fn open(paths: &[PathBuf]) -> Result<Self> {
        let mut sinks = Self::new();
        let mut next_handle = FIRST_FILE_HANDLE;
        for path in paths {
            if is_stdout(path) {
                sinks.push(STDOUT_HANDLE, Box::new(io::stdout()));
                continue;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create predictions file: {}", path.display()))?;
            sinks.push(next_handle, Box::new(BufWriter::new(file)));
            next_handle += 1;
        }
        Ok(sinks)
    }

    pub fn handles(&self) -> Vec<i32> {
        self.sinks.iter().map(|s| s.handle).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Write `bytes` to every enabled sink. Returns how many writes succeeded.
    ///
    /// Write failures are not surfaced; they are traced at debug level and the
    /// remaining sinks are still written.
    pub fn write_all(&mut self, bytes: &[u8]) -> usize {
        let mut written = 0;
        for sink in self.sinks.iter_mut().filter(|s| s.handle > 0) {
            match sink.writer.write_all(bytes) {
                Ok(()) => written += 1,
                Err(err) => debug!(handle = sink.handle, error = %err, "prediction write failed"),
            }
        }
        written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        for sink in self.sinks.iter_mut().filter(|s| s.handle > 0) {
            sink.writer.flush()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PredictionSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionSinks")
            .field("handles", &self.handles())
            .finish()
    }
}

fn is_stdout(path: &Path) -> bool {
    path == Path::new("-") || path == Path::new("/dev/stdout")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_non_positive_handles_are_skipped() {
        let (a, b, c) = (Shared::default(), Shared::default(), Shared::default());
        let mut sinks = PredictionSinks::new();
        sinks.push(3, Box::new(a.clone()));
        sinks.push(0, Box::new(b.clone()));
        sinks.push(7, Box::new(c.clone()));

        assert_eq!(sinks.write_all(b"1,0.5\n"), 2);
        assert_eq!(a.0.borrow().as_slice(), b"1,0.5\n");
        assert!(b.0.borrow().is_empty());
        assert_eq!(c.0.borrow().as_slice(), b"1,0.5\n");
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_is_not_counted() {
        let ok = Shared::default();
        let mut sinks = PredictionSinks::new();
        sinks.push(3, Box::new(Broken));
        sinks.push(4, Box::new(ok.clone()));

        assert_eq!(sinks.write_all(b"0.5,1\n"), 1);
        assert_eq!(ok.0.borrow().as_slice(), b"0.5,1\n");
    }

    #[test]
    fn test_open_assigns_file_handles() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = vec![dir.path().join("a.txt"), PathBuf::from("-"), dir.path().join("b.txt")];

        let mut sinks = PredictionSinks::open(&paths).unwrap();
        assert_eq!(sinks.handles(), vec![3, 1, 4]);

        sinks.sinks.remove(1);
        sinks.write_all(b"2,0.25\n");
        sinks.flush().unwrap();

        let a = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        let b = std::fs::read_to_string(dir.path().join("b.txt")).unwrap();
        assert_eq!(a, "2,0.25\n");
        assert_eq!(b, a);
    }
}

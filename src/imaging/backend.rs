//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipe executor
//! needs: open a source once, then render any number of pipes from it.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and built on
//! the `image` crate. Tests use the recording `MockBackend` in this module.

use super::params::PipeDescriptor;
use crate::formats::OutputFormat;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("No encoder available for {0}")]
    UnsupportedEncoder(OutputFormat),
}

/// Trait for image processing backends.
///
/// `open` produces the decode-entry handle for one input file. The executor
/// calls it at most once per file and shares the handle read-only across all
/// of that file's pipes, which may render concurrently.
pub trait ImageBackend: Sync {
    /// Decoded source image, branched once per pipe.
    type Source: Send + Sync;

    /// Read and decode an input file.
    fn open(&self, path: &Path) -> Result<Self::Source, BackendError>;

    /// Resize (if requested), encode and write one output file.
    fn render(&self, source: &Self::Source, pipe: &PipeDescriptor) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{Dimension, EncodeOptions, ResizeInstruction};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        /// Make every `open` fail with an IO error.
        pub fail_open: bool,
        /// Output file names whose render fails.
        pub fail_outputs: Vec<String>,
        /// Output file names whose render panics.
        pub panic_outputs: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Open(String),
        Render {
            source: String,
            output: String,
            format: OutputFormat,
            resize: Option<(Dimension, u32)>,
            encode: EncodeOptions,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_open() -> Self {
            Self {
                fail_open: true,
                ..Self::default()
            }
        }

        pub fn failing_outputs(names: &[&str]) -> Self {
            Self {
                fail_outputs: names.iter().map(|n| n.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn panicking_outputs(names: &[&str]) -> Self {
            Self {
                panic_outputs: names.iter().map(|n| n.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn open_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Open(_)))
                .count()
        }

        /// Rendered output paths, sorted (render order is unspecified).
        pub fn rendered_outputs(&self) -> Vec<String> {
            let mut outputs: Vec<String> = self
                .get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Render { output, .. } => Some(output),
                    RecordedOp::Open(_) => None,
                })
                .collect();
            outputs.sort();
            outputs
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    impl ImageBackend for MockBackend {
        type Source = PathBuf;

        fn open(&self, path: &Path) -> Result<PathBuf, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Open(path.to_string_lossy().to_string()));

            if self.fail_open {
                return Err(BackendError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "mock open failure",
                )));
            }
            Ok(path.to_path_buf())
        }

        fn render(&self, source: &PathBuf, pipe: &PipeDescriptor) -> Result<(), BackendError> {
            let name = file_name(&pipe.output_path);
            if self.panic_outputs.contains(&name) {
                panic!("mock codec crashed on {name}");
            }

            self.operations.lock().unwrap().push(RecordedOp::Render {
                source: source.to_string_lossy().to_string(),
                output: pipe.output_path.to_string_lossy().to_string(),
                format: pipe.format,
                resize: pipe.resize.map(|r| (r.dimension, r.value)),
                encode: pipe.encode.clone(),
            });

            if self.fail_outputs.contains(&name) {
                return Err(BackendError::Encode(format!("mock failure for {name}")));
            }
            Ok(())
        }
    }

    fn pipe(output: &str) -> PipeDescriptor {
        PipeDescriptor {
            target: "full".to_string(),
            output_path: PathBuf::from(output),
            resize: Some(ResizeInstruction {
                dimension: Dimension::Width,
                value: 800,
            }),
            format: OutputFormat::Webp,
            encode: EncodeOptions::default(),
        }
    }

    #[test]
    fn mock_records_open() {
        let backend = MockBackend::new();
        let source = backend.open(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(source, PathBuf::from("/test/image.jpg"));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Open(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_records_render() {
        let backend = MockBackend::new();
        backend
            .render(&PathBuf::from("/source.jpg"), &pipe("/out/source.webp"))
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Render {
                format: OutputFormat::Webp,
                resize: Some((Dimension::Width, 800)),
                ..
            }
        ));
    }

    #[test]
    fn mock_fails_selected_outputs() {
        let backend = MockBackend::failing_outputs(&["bad.webp"]);
        let source = PathBuf::from("/source.jpg");
        assert!(backend.render(&source, &pipe("/out/good.webp")).is_ok());
        assert!(backend.render(&source, &pipe("/out/bad.webp")).is_err());
    }

    #[test]
    fn mock_failing_open() {
        let backend = MockBackend::failing_open();
        let err = backend.open(Path::new("/missing.jpg")).unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
    }
}

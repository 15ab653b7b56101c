//! # imp
//!
//! A batch image processor. One config file describes a set of *targets*
//! (scale mode, optional width or height, filename suffix, output formats);
//! every input image is turned into one output file per (target, format)
//! pair.
//!
//! # Architecture: Plan, Then Execute
//!
//! ```text
//! imp.toml + CLI  ->  ResolvedConfig              (config)
//! per input file  ->  PipeSet                     (plan, formats)
//! PipeSet         ->  output files                (process, imaging)
//! all files       ->  total count or first error  (process)
//! ```
//!
//! Planning is pure: a [`plan::PipeSet`] is derived from the target table
//! and the input's base name without touching the filesystem, so every
//! naming and classification rule is unit tested without encoding images.
//! Execution decodes each source exactly once and renders all of its pipes
//! from that one decoded image in parallel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`formats`] | Catalog of output format identifiers, aliases and extensions |
//! | [`plan`] | Pipe planner and pipe set builder: (target, format) -> output descriptor |
//! | [`process`] | Pipe executor and batch runner with cancellation and progress events |
//! | [`imaging`] | Backend trait and the pure-Rust decode/resize/encode implementation |
//! | [`config`] | Config file discovery, loading, CLI overrides and validation |
//! | [`error`] | Process-boundary error and sysexits exit statuses |
//! | [`logging`] | `env_logger` sink and level precedence |
//! | [`output`] | CLI progress formatting |
//!
//! # Design Decisions
//!
//! ## Skip Unknown Formats, Reject Unknown Modes
//!
//! A format the catalog does not know only affects its own pipe: it is
//! logged, skipped, and the rest of the target still runs. A broken scale
//! mode makes every output of that target meaningless, so it aborts the
//! file's pipe set and exits with the configuration status.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resizing and encoding are done with the `image` crate
//! (AVIF via `rav1e`). The binary has no system codec dependencies. HEIF is
//! a known format but has no pure-Rust encoder; its pipes fail per file.
//!
//! ## Failures Stay Per File
//!
//! Input files never affect each other. The batch finishes every file even
//! after a failure, keeps whatever outputs were written, and reports the
//! first failure in input order.

pub mod config;
pub mod error;
pub mod formats;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod plan;
pub mod process;

#[cfg(test)]
pub(crate) mod test_helpers;

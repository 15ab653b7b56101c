//! CLI progress output.
//!
//! Progress lines go to stdout; diagnostics go through `log` to stderr. The
//! display is input-centric: each file leads with its positional index and
//! name, and every pipe is shown as an indented `target -> output` line.
//!
//! ```text
//! Config imp.toml
//!     Output: out/
//!     Targets: full (png), small (webp, jpg)
//!
//! 001 dawn.png
//!     full -> out/dawn.png
//!     small -> out/dawn-400w.webp
//!     small -> out/dawn-400w.jpg: failed (Encode failed: ...)
//!     skipped: small (bmp)
//! 002 broken.png
//!     error: broken.png: Could not read source image: ...
//! ```
//!
//! Each event has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::ResolvedConfig;
use crate::process::{PipeStatus, ProcessEvent};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format the run header: where the config came from and what it asks for.
pub fn format_run_header(config: &ResolvedConfig) -> Vec<String> {
    let targets: Vec<String> = config
        .targets
        .iter()
        .map(|(name, target)| format!("{} ({})", name, target.formats.join(", ")))
        .collect();
    vec![
        format!("Config {}", config.source.display()),
        format!("{}Output: {}", indent(1), config.output_dir.display()),
        format!("{}Targets: {}", indent(1), targets.join(", ")),
        String::new(),
    ]
}

pub fn print_run_header(config: &ResolvedConfig) {
    for line in format_run_header(config) {
        println!("{}", line);
    }
}

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::FileProcessed {
            index,
            input,
            pipes,
            skipped,
        } => {
            let mut lines = vec![format!("{} {}", format_index(*index), file_label(input))];
            for pipe in pipes {
                let line = format!("{}{} -> {}", indent(1), pipe.target, pipe.output.display());
                lines.push(match &pipe.status {
                    PipeStatus::Written => line,
                    PipeStatus::Failed(reason) => format!("{line}: failed ({reason})"),
                    PipeStatus::Cancelled => format!("{line}: cancelled"),
                });
            }
            for skip in skipped {
                lines.push(format!("{}skipped: {} ({})", indent(1), skip.target, skip.format));
            }
            lines
        }
        ProcessEvent::FileFailed {
            index,
            input,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_label(input)),
            format!("{}error: {}", indent(1), error),
        ],
    }
}

pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::SkippedPipe;
    use crate::process::PipeReport;
    use crate::test_helpers::*;
    use std::path::PathBuf;

    #[test]
    fn header_lists_targets_in_declaration_order() {
        let config = resolved_config(
            &["in/a.png"],
            "out",
            targets(&[
                ("small", keep_aspect(Some(400), None, "-400w", &["webp", "jpg"])),
                ("full", no_scale("", &["png"])),
            ]),
        );
        let lines = format_run_header(&config);
        assert_eq!(lines[0], "Config imp.toml");
        assert_eq!(lines[1], "    Output: out");
        assert_eq!(lines[2], "    Targets: small (webp, jpg), full (png)");
    }

    #[test]
    fn processed_file_shows_every_pipe() {
        let event = ProcessEvent::FileProcessed {
            index: 1,
            input: PathBuf::from("in/dawn.png"),
            pipes: vec![
                PipeReport {
                    target: "full".to_string(),
                    output: PathBuf::from("out/dawn.png"),
                    status: PipeStatus::Written,
                },
                PipeReport {
                    target: "small".to_string(),
                    output: PathBuf::from("out/dawn-400w.jpg"),
                    status: PipeStatus::Failed("disk full".to_string()),
                },
            ],
            skipped: vec![SkippedPipe {
                target: "small".to_string(),
                format: "bmp".to_string(),
            }],
        };
        assert_eq!(
            format_process_event(&event),
            vec![
                "001 dawn.png",
                "    full -> out/dawn.png",
                "    small -> out/dawn-400w.jpg: failed (disk full)",
                "    skipped: small (bmp)",
            ]
        );
    }

    #[test]
    fn cancelled_pipe_is_marked() {
        let event = ProcessEvent::FileProcessed {
            index: 12,
            input: PathBuf::from("a.png"),
            pipes: vec![PipeReport {
                target: "full".to_string(),
                output: PathBuf::from("out/a.png"),
                status: PipeStatus::Cancelled,
            }],
            skipped: vec![],
        };
        let lines = format_process_event(&event);
        assert_eq!(lines[0], "012 a.png");
        assert_eq!(lines[1], "    full -> out/a.png: cancelled");
    }

    #[test]
    fn failed_file_shows_error() {
        let event = ProcessEvent::FileFailed {
            index: 2,
            input: PathBuf::from("in/broken.png"),
            error: "in/broken.png: No pipes to process".to_string(),
        };
        assert_eq!(
            format_process_event(&event),
            vec!["002 broken.png", "    error: in/broken.png: No pipes to process"]
        );
    }
}

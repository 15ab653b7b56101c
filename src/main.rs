use clap::Parser;
use imp::config::{self, CliOverrides};
use imp::error::{EXIT_CONFIG, EXIT_INTERRUPTED, ImpError};
use imp::process::{self, Cancellation};
use imp::{logging, output};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let described = env!("IMP_GIT_DESCRIBE");
    if env!("IMP_RELEASE_BUILD") == "true" || described.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} (dev@{described})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "imp")]
#[command(about = "Batch image processor: one config, many output sizes and formats")]
#[command(long_about = "\
Batch image processor: one config, many output sizes and formats

Every input image is rendered once per (target, format) pair declared in the
config file. Output files are named

  <output_dir>/<input base name><filename_suffix>.<extension>

Example imp.toml:

  input_files = [\"photos/\"]
  output_dir = \"dist\"

  [targets.full]
  mode = \"no-scale\"
  formats = [\"jpeg\", \"webp\"]

  [targets.small]
  mode = \"keep-aspect\"
  width = 400
  filename_suffix = \"-400w\"
  formats = [\"avif\", \"jpeg\"]

Exit statuses: 0 success, 65 an input failed, 70 internal error,
78 configuration error, 130 interrupted.

Run 'imp --gen-config' to print a documented config file.")]
#[command(version = version_string())]
struct Cli {
    /// Input files or directories (replace `input_files` from the config)
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Config file to use instead of searching for imp.toml
    #[arg(short = 'c', long)]
    config_file: Option<PathBuf>,

    /// Output directory (replaces `output_dir` from the config)
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Debug logging; wins over --quiet
    #[arg(short, long)]
    debug: bool,

    /// No log output and no progress lines
    #[arg(short, long)]
    quiet: bool,

    /// Print a stock imp.toml with all options documented
    #[arg(long)]
    gen_config: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            e.print().ok();
            std::process::exit(EXIT_CONFIG);
        }
        Err(e) => e.exit(),
    };

    // Flags apply before the config file is read; the file may refine them.
    logging::init(logging::resolve_level(cli.quiet, cli.debug, None));

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return;
    }

    match run(&cli) {
        Ok(count) => log::info!("Processed {count} pipes!"),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: &Cli) -> Result<usize, ImpError> {
    let cwd = std::env::current_dir()
        .map_err(|e| ImpError::Internal(format!("cannot read working directory: {e}")))?;
    let overrides = CliOverrides {
        config_file: cli.config_file.clone(),
        inputs: cli.inputs.clone(),
        output_dir: cli.output_dir.clone(),
    };
    let config = config::resolve(&overrides, &cwd)?;

    logging::set_level(logging::resolve_level(
        cli.quiet,
        cli.debug,
        config.logging.level.as_deref(),
    ));
    match serde_json::to_string_pretty(&config) {
        Ok(json) => log::debug!("Resolved configuration:\n{json}"),
        Err(e) => log::debug!("Resolved configuration could not be serialized: {e}"),
    }

    init_thread_pool(&config.processing);
    let cancel = Cancellation::new();
    watch_interrupt(cancel.clone());

    let quiet = cli.quiet;
    if !quiet {
        output::print_run_header(&config);
    }
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            if !quiet {
                output::print_process_event(&event);
            }
        }
    });
    let result = process::process(&config, &cancel, Some(tx));
    printer
        .join()
        .map_err(|_| ImpError::Internal("progress printer panicked".to_string()))?;

    if cancel.is_cancelled() {
        return Err(ImpError::Interrupted);
    }
    Ok(result?)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    log::debug!("Using {threads} worker thread(s)");
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Watch for SIGINT on a side thread.
///
/// The first Ctrl-C stops new files and pipes from starting and lets running
/// encoders finish. A second one exits immediately.
fn watch_interrupt(cancel: Cancellation) {
    let spawned = std::thread::Builder::new()
        .name("imp-signal".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    log::warn!("Interrupt handling unavailable: {e}");
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                log::info!("Caught interrupt signal (Ctrl-C). Exiting!");
                cancel.cancel();
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(EXIT_INTERRUPTED);
                }
            });
        });
    if let Err(e) = spawned {
        log::warn!("Interrupt handling unavailable: {e}");
    }
}

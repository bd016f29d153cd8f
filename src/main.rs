use clap::{Parser, Subcommand};
use folio_assets::optimize::{RunOptions, RunPaths};
use folio_assets::resolve::{LoadingHints, ResolveOptions, ResolvedSources, Resolver};
use folio_assets::{audit, config, optimize, output, resolve, sweep};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio-assets")]
#[command(about = "Responsive image variants for a static portfolio")]
#[command(long_about = "\
Responsive image variants for a static portfolio

Every source image under public/images/ is expanded into resized WebP and
raster variants under public/images/optimized/:

  public/images/
  ├── sunset.jpg                   # source
  ├── logo.png                     # source (PNG stays PNG)
  └── optimized/
      ├── sunset-96.webp           # one pair per width
      ├── sunset-96.jpg
      ├── ...
      └── logo-2560.png

Sources whose variants are all present and newer than the source are skipped.
Variants whose source no longer exists are deleted.

Run 'folio-assets gen-config' to generate a documented folio.toml.")]
#[command(version)]
#[command(ignore_errors = true)]
struct Cli {
    /// Project root (contains folio.toml and public/)
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Delete the output directory before generating
    #[arg(long, global = true)]
    clean: bool,

    /// Regenerate every source, even when its variants are fresh
    #[arg(long, global = true)]
    force: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate missing or stale variants (default)
    Optimize,
    /// Delete variants whose source no longer exists
    Sweep,
    /// Print the responsive sources for an image reference as JSON
    Resolve(ResolveArgs),
    /// Verify every URL the resolver emits exists on disk
    Check,
    /// Print a stock folio.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ResolveArgs {
    /// Logical reference, e.g. /images/sunset.jpg
    reference: String,

    /// CSS sizes value passed through to every source
    #[arg(long)]
    sizes: Option<String>,

    /// Comma-separated widths overriding the configured list
    #[arg(long, value_delimiter = ',')]
    widths: Option<Vec<u32>>,

    /// Above-the-fold image: eager loading, high fetch priority
    #[arg(long)]
    priority: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveOutput {
    #[serde(flatten)]
    sources: ResolvedSources,
    loading_hints: LoadingHints,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Command::Optimize);
    if let Command::GenConfig = command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let config = config::load_config(&cli.project)?;
    let paths = RunPaths::from_config(&config, &cli.project);

    let success = match command {
        Command::Optimize => {
            let options = RunOptions {
                clean: cli.clean,
                force: cli.force,
            };
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_optimize_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = optimize::optimize(&config, &paths, options, Some(tx));
            printer.join().map_err(|_| "output thread panicked")?;
            let report = result?;
            output::print_optimize_summary(&report);
            !report.has_failures()
        }
        Command::Sweep => {
            if !paths.input_dir.is_dir() {
                return Err(optimize::OptimizeError::InputNotFound(paths.input_dir).into());
            }
            let result = sweep::sweep_orphans(
                &paths.input_dir,
                &paths.output_dir,
                &config.generator.widths,
            )?;
            output::print_sweep_output(&result);
            result.failed.is_empty()
        }
        Command::Resolve(args) => {
            let resolver = Resolver::new(&config.resolver);
            let options = ResolveOptions {
                sizes: args.sizes,
                widths: args.widths,
            };
            let resolved = ResolveOutput {
                sources: resolver.resolve(&args.reference, &options),
                loading_hints: resolve::loading_hints(args.priority),
            };
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            true
        }
        Command::Check => {
            println!("==> Checking {}", paths.output_dir.display());
            let report = audit::audit(&config, &paths.input_dir, &paths.output_dir)?;
            output::print_audit_report(&report);
            report.is_clean()
        }
        Command::GenConfig => true,
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

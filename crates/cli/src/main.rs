mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use devshell_lib::consts::{INDEX_ENV, MANIFEST_FILE};
use devshell_lib::env::Shell;
use devshell_lib::platform::Platform;

use crate::cmd::ProjectArgs;
use crate::output::{OutputFormat, print_error};

/// Reproducible development environments and builds for native Rust projects
#[derive(Parser)]
#[command(name = "devshell", author, version, about)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Project manifest
  #[arg(short, long, global = true, default_value = MANIFEST_FILE)]
  file: PathBuf,

  /// Package index [default: packages.toml next to the manifest]
  #[arg(long, global = true, env = INDEX_ENV)]
  index: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show host platform and store locations
  Info {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },

  /// Print the assembled environment
  Env {
    /// Platform key (e.g. x86_64-linux) [default: host]
    #[arg(short, long)]
    platform: Option<Platform>,

    /// Print an export script instead of NAME=value lines. Without a value
    /// the shell is taken from $SHELL
    #[arg(short, long, num_args = 0..=1)]
    shell: Option<Option<Shell>>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },

  /// Open a session with the environment applied
  Shell {
    #[arg(short, long)]
    platform: Option<Platform>,

    /// Command to run instead of $SHELL
    #[arg(last = true)]
    command: Vec<String>,
  },

  /// Assemble the environment for every platform in the package index
  Check {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },

  /// Build the default package
  Build {
    #[arg(short, long)]
    platform: Option<Platform>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },

  /// Create devshell.toml and packages.toml templates
  Init {
    /// Project directory
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Project name [default: directory name]
    #[arg(long)]
    name: Option<String>,
  },
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let project = ProjectArgs {
    file: cli.file,
    index: cli.index,
  };

  let result = match cli.command {
    Commands::Info { format } => cmd::cmd_info(format).map(|_| ExitCode::SUCCESS),
    Commands::Env {
      platform,
      shell,
      format,
    } => {
      let shell = shell.map(|s| s.unwrap_or_else(Shell::detect));
      cmd::cmd_env(&project, platform, shell, format).map(|_| ExitCode::SUCCESS)
    }
    Commands::Shell { platform, command } => cmd::cmd_shell(&project, platform, &command),
    Commands::Check { format } => cmd::cmd_check(&project, format),
    Commands::Build { platform, format } => cmd::cmd_build(&project, platform, format),
    Commands::Init { dir, name } => cmd::cmd_init(dir, name).map(|_| ExitCode::SUCCESS),
  };

  match result {
    Ok(code) => code,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}

mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::compile::SelectionArgs;
use commands::{EXIT_CONFLICT, EXIT_FAILURE, EXIT_INPUT_ERROR};
use devstaller_core::CompileOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "ckan-devstaller-builder",
    version,
    about = "Build ckan-devstaller installation commands from presets, extensions, and features"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile a selection into a ckan-devstaller command.
    Compile {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Prepend the script that downloads the installer.
        #[arg(long, default_value_t = false)]
        download_script: bool,
        /// Ask the installer to skip its interactive prompts.
        #[arg(long, default_value_t = false)]
        skip_interactive: bool,
        /// Ask the installer not to start CKAN when it finishes.
        #[arg(long, default_value_t = false)]
        skip_run: bool,
        /// Write the command to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the resulting selection as a builder file.
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// List the built-in presets.
    Presets,
    /// List known extensions and features with their prerequisites.
    Options,
    /// Parse a ckan-devstaller command back into a selection.
    Parse {
        /// Command text; reads stdin when omitted or "-".
        command: Option<String>,
    },
    /// Apply builder actions read from stdin, one per line.
    Session,
    /// Interactively build a command.
    Wizard,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DEVSTALLER_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Compile {
            selection,
            download_script,
            skip_interactive,
            skip_run,
            output,
            save,
        } => commands::compile::run(
            &selection,
            CompileOptions {
                download_script,
                skip_interactive,
                skip_run,
            },
            output.as_deref(),
            save.as_deref(),
            json_output,
        ),
        Commands::Presets => commands::presets::run(json_output),
        Commands::Options => commands::options::run(json_output),
        Commands::Parse { command } => commands::parse::run(command.as_deref(), json_output),
        Commands::Session => commands::session::run(json_output),
        Commands::Wizard => commands::wizard::run(json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("builder file error:")
                || msg.starts_with("command parse error:")
            {
                EXIT_INPUT_ERROR
            } else if msg.starts_with("builder error:") {
                EXIT_CONFLICT
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

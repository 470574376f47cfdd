mod commands;
mod helpers;

use clap::Parser;
use simularium_core::ConversionError;

const PROGRAM_NAME: &str = "smoldyn2simularium";
const USAGE_EXIT_CODE: i32 = 1;

pub fn run_from_env() -> i32 {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            for line in error.diagnostic_lines() {
                eprintln!("{}", line);
            }
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "smoldyn2simularium",
    version,
    about = "Convert Smoldyn trajectories in COMBINE archives to Simularium files"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Convert an archive's Smoldyn output log into a Simularium file
    Convert(commands::ConvertArgs),
    /// Show the files, species and frames an archive resolves to
    Inspect(commands::InspectArgs),
    /// Summarize an existing Simularium file in either encoding
    Decode(commands::DecodeArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Convert(args) => commands::run_convert_command(args),
        CliCommand::Inspect(args) => commands::run_inspect_command(args),
        CliCommand::Decode(args) => commands::run_decode_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Internal(_) => USAGE_EXIT_CODE,
            Self::Conversion(error) => error.exit_code(),
        }
    }

    fn diagnostic_lines(&self) -> Vec<String> {
        match self {
            Self::Usage(message) => vec![format!("ERROR: [CLI.USAGE] {}", message.trim_end())],
            Self::Conversion(error) => vec![error.diagnostic_line(), error.stage_line()],
            Self::Internal(error) => vec![format!("ERROR: [CLI.INTERNAL] {error:#}")],
        }
    }
}

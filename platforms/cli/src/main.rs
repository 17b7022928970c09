use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use tmsim::loader::ProgramLoader;
use tmsim::programs::ProgramManager;
use tmsim::{
    run, Config, MachineReport, Mode, Observer, Program, Report, Status, Tape, Verdict,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(group(ArgGroup::new("mode").required(true).args(["dtm", "ndtm", "list"])))]
struct Cli {
    /// The Turing Machine script to run
    #[clap(short, long, value_name = "FILE", conflicts_with = "program")]
    read_file: Option<PathBuf>,

    /// Run a built-in program by name
    #[clap(short, long, value_name = "NAME")]
    program: Option<String>,

    /// Run every tape as an independent deterministic machine
    #[clap(long)]
    dtm: bool,

    /// Run the single tape as a non-deterministic machine
    #[clap(long)]
    ndtm: bool,

    /// Print every step of every machine
    #[clap(short, long)]
    verbose: bool,

    /// Stop the remaining machines as soon as one accepts
    #[clap(short, long)]
    first_accept: bool,

    /// Number of worker threads for deterministic runs
    #[clap(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..))]
    jobs: u8,

    /// Refuse to run a deterministic machine with ambiguous transitions
    #[clap(long)]
    strict: bool,

    /// Output format of the final report
    #[clap(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// List the built-in programs
    #[clap(long)]
    list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Prints machines as they run, in the same layout as the final report.
struct Printer {
    verbose: bool,
    color: bool,
}

impl Observer for Printer {
    fn on_start(&self, index: usize, tape: &Tape) {
        if self.verbose {
            print!("{}", self.running(index, &tape.to_string(), tape.head()));
        }
    }

    fn on_step(&self, index: usize, tape: &Tape, status: Status) {
        if status == Status::Running {
            print!("{}", self.running(index, &tape.to_string(), tape.head()));
        }
    }
}

impl Printer {
    fn running(&self, index: usize, tape: &str, head: usize) -> String {
        format!(
            "Turing Machine {} Running...\n{}",
            index,
            self.tape(tape, head)
        )
    }

    /// The tape and a caret line under the head.
    fn tape(&self, tape: &str, head: usize) -> String {
        let symbols: String = tape
            .chars()
            .enumerate()
            .map(|(position, symbol)| {
                if position == head && self.color {
                    format!("\x1b[1;31m{}\x1b[0m", symbol)
                } else {
                    symbol.to_string()
                }
            })
            .collect();

        let caret = if self.color {
            "\x1b[1;31m^\x1b[0m"
        } else {
            "^"
        };

        format!("{}\n{}{}\n", symbols, " ".repeat(head), caret)
    }

    fn status(&self, index: Option<usize>, verdict: Verdict) -> String {
        let name = match index {
            Some(index) => format!("Turing Machine {}", index),
            None => "Turing Machine".to_string(),
        };

        let (line, color) = match verdict {
            Verdict::Accepted => (format!("{} in Accept State!", name), "\x1b[1;32m"),
            Verdict::Halted => (format!("{} Stopped!", name), "\x1b[1;31m"),
            Verdict::Stopped => (format!("{} Interrupted.", name), "\x1b[1;33m"),
        };

        if self.color {
            format!("{}{}\x1b[0m", color, line)
        } else {
            line
        }
    }

    fn machine(&self, machine: &MachineReport) -> String {
        format!(
            "{}{}\n",
            self.tape(&machine.tape, machine.head),
            self.status(Some(machine.index), machine.verdict)
        )
    }

    fn report(&self, report: &Report) -> String {
        match report.mode {
            Mode::Deterministic => report
                .machines
                .iter()
                .map(|machine| self.machine(machine))
                .collect(),
            Mode::NonDeterministic => match report.accepting().next() {
                Some(winner) => self.machine(winner),
                None => format!("{}\n", self.status(None, Verdict::Halted)),
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list {
        for name in ProgramManager::list_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let program = load_program(&cli)?;

    let mode = if cli.ndtm {
        Mode::NonDeterministic
    } else {
        Mode::Deterministic
    };
    let config = Config::new(mode)
        .with_verbose(cli.verbose && cli.format == Format::Text)
        .with_first_accept(cli.first_accept)
        .with_jobs(cli.jobs.into())
        .with_strict(cli.strict);
    debug!(?config, "configured run");

    let printer = Printer {
        verbose: config.verbose,
        color: atty::is(atty::Stream::Stdout),
    };
    let report = run(&program, &config, &printer)?;

    match cli.format {
        Format::Text => print!("{}", printer.report(&report)),
        Format::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}

fn load_program(cli: &Cli) -> Result<Program> {
    if let Some(path) = &cli.read_file {
        return ProgramLoader::load_program(path)
            .with_context(|| format!("failed to load script {}", path.display()));
    }

    if let Some(name) = &cli.program {
        return ProgramManager::get_by_name(name)
            .with_context(|| format!("failed to load built-in program {}", name));
    }

    if atty::isnt(atty::Stream::Stdin) {
        return ProgramLoader::load_program_from_reader(io::stdin().lock())
            .context("failed to load script from stdin");
    }

    bail!("no script given: pass --read-file, --program or pipe a script on stdin")
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

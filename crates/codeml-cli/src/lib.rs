use std::path::{self, Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use codeml_config::{LoadOptions, Settings};
use codeml_core::{
    parse_results, read_control_file, Codeml, CodemlError, CodemlResults, ControlPaths, ExitCode,
    OptionKey, OptionValue, Options, PathField, RunOptions, Runner,
};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut load = LoadOptions::default();
    if let Some(path) = cli.config {
        load = load.with_override_path(path);
    }
    let settings = Settings::load(load)?;
    debug!(
        layers = settings.sources.layers.len(),
        working_dir = %settings.sources.working_directory.display(),
        "loaded settings"
    );

    let outcome = match cli.command {
        Command::Ctl(CtlArgs {
            command: CtlCommand::Write(args),
        }) => handle_write(&settings, args),
        Command::Ctl(CtlArgs {
            command: CtlCommand::Show(args),
        }) => handle_show(args),
        Command::Parse(args) => handle_parse(args),
        Command::Run(args) => handle_run(&settings, args),
    };

    match outcome {
        Ok(code) => Ok(code),
        Err(err) => match err.downcast::<CodemlError>() {
            Ok(err) => {
                eprintln!("codeml-tool: {err}");
                Ok(err.exit_code() as i32)
            }
            Err(other) => Err(other),
        },
    }
}

fn handle_write(settings: &Settings, args: WriteArgs) -> Result<i32> {
    let WriteArgs {
        alignment,
        tree,
        out,
        set,
        ctl,
        working_dir,
    } = args;

    let working_dir = working_dir.unwrap_or_else(|| settings.sources.working_directory.clone());

    // Without an explicit location the job's own default, inside the working
    // directory, applies.
    let mut job = Codeml::new(working_dir).with_paths(ControlPaths::new(alignment, tree, out));
    if let Some(ctl_file) = ctl.or_else(|| settings.job.ctl_file.clone()) {
        job = job.with_ctl_file(ctl_file);
    }
    for (key, value) in &set {
        apply_assignment(&mut job.options, key, value)?;
    }

    job.write_ctl_file()?;
    println!("wrote {}", job.ctl_file().display());
    Ok(ExitCode::Success as i32)
}

fn handle_show(args: ShowArgs) -> Result<i32> {
    let ShowArgs { ctl, format } = args;
    let parsed = read_control_file(&ctl)?;

    match format.unwrap_or(FormatValue::Plain) {
        FormatValue::Plain => {
            for field in PATH_FIELDS {
                let value = parsed
                    .paths
                    .get(field)
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "None".into());
                println!("{} = {}", field.key(), value);
            }
            emit(&parsed.options.dump());
        }
        FormatValue::Json => {
            let mut paths = Map::new();
            for field in PATH_FIELDS {
                let value = parsed
                    .paths
                    .get(field)
                    .map(|path| Value::String(path.display().to_string()))
                    .unwrap_or(Value::Null);
                paths.insert(field.key().to_owned(), value);
            }
            let mut options = Map::new();
            for (key, value) in parsed.options.snapshot() {
                options.insert(key.to_string(), serde_json::to_value(value)?);
            }
            let payload = json!({ "paths": paths, "options": options });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }
    Ok(ExitCode::Success as i32)
}

fn handle_parse(args: ParseArgs) -> Result<i32> {
    let ParseArgs { report, format } = args;

    let results = match parse_results(&report) {
        Ok(results) => results,
        // An unreadable report counts as a results failure, not a general one.
        Err(err @ CodemlError::Io { .. }) => {
            eprintln!("codeml-tool: {err}");
            return Ok(ExitCode::InvalidResults as i32);
        }
        Err(err) => return Err(err.into()),
    };

    emit_results(&results, format.unwrap_or(FormatValue::Plain))?;
    Ok(ExitCode::Success as i32)
}

fn handle_run(settings: &Settings, args: RunArgs) -> Result<i32> {
    let RunArgs {
        ctl,
        working_dir,
        command,
        verbose,
        no_parse,
        format,
    } = args;

    let ctl = path::absolute(&ctl)
        .with_context(|| format!("failed to resolve control file {}", ctl.display()))?;
    let working_dir = match working_dir {
        Some(dir) => dir,
        None => ctl
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| settings.sources.working_directory.clone()),
    };

    let mut job = Codeml::new(working_dir).with_ctl_file(&ctl);
    job.read_ctl_file(&ctl)?;

    let runner = Runner::new(RunOptions {
        command: command.unwrap_or_else(|| settings.engine.command.clone()),
        verbose: verbose || settings.engine.verbose,
        parse: settings.engine.parse && !no_parse,
    });

    if let Some(results) = runner.run_existing(&job)? {
        emit_results(&results, format.unwrap_or(FormatValue::Plain))?;
    }
    Ok(ExitCode::Success as i32)
}

const PATH_FIELDS: [PathField; 3] = [PathField::Alignment, PathField::Tree, PathField::OutFile];

/// `key=None` unsets the option; anything else is read as a control file would.
fn apply_assignment(options: &mut Options, key: &str, raw: &str) -> Result<(), CodemlError> {
    let key = key.parse::<OptionKey>()?;
    if raw == "None" {
        return options.set_key(key, None);
    }
    options.set_key(key, OptionValue::parse_for(key, raw)?)
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn emit_results(results: &CodemlResults, format: FormatValue) -> Result<()> {
    match format {
        FormatValue::Plain => emit(&render_summary(results)),
        FormatValue::Json => println!("{}", serde_json::to_string_pretty(results)?),
    }
    Ok(())
}

fn render_summary(results: &CodemlResults) -> String {
    let mut out = String::new();
    let headers = [
        ("version", results.version.as_deref()),
        ("model", results.model.as_deref()),
        ("codon model", results.codon_model.as_deref()),
        ("site-class model", results.site_class_model.as_deref()),
    ];
    for (label, value) in headers {
        if let Some(value) = value {
            out.push_str(&format!("{label}: {value}\n"));
        }
    }
    if let Some(genes) = results.genes {
        out.push_str(&format!("genes: {genes}\n"));
    }
    if let Some(lnl_max) = results.lnl_max {
        out.push_str(&format!("lnL max: {lnl_max}\n"));
    }

    for model in &results.site_class_models {
        out.push_str(&format!("Model {}: {}\n", model.number, model.description));
        if let Some(lnl) = model.lnl {
            out.push_str(&format!("  lnL = {lnl}\n"));
        }
        if let Some(length) = model.tree_length {
            out.push_str(&format!("  tree length = {length}\n"));
        }
        if let Some(kappa) = model.parameters.kappa {
            out.push_str(&format!("  kappa = {kappa}\n"));
        }
        if let Some(omega) = model.parameters.omega {
            out.push_str(&format!("  omega = {omega}\n"));
        }
    }

    for (first, row) in &results.pairwise {
        for (second, stats) in row {
            if first >= second {
                continue;
            }
            out.push_str(&format!("{first} vs {second}:"));
            if let Some(lnl) = stats.lnl {
                out.push_str(&format!(" lnL = {lnl}"));
            }
            if let Some(omega) = stats.omega {
                out.push_str(&format!(" dN/dS = {omega}"));
            }
            out.push('\n');
        }
    }

    if !results.distances.raw.is_empty() {
        out.push_str(&format!(
            "raw distances: {} sequences\n",
            results.distances.raw.len()
        ));
    }
    if !results.distances.ml.is_empty() {
        out.push_str(&format!(
            "ML distances: {} sequences\n",
            results.distances.ml.len()
        ));
    }
    out
}

fn emit(content: &str) {
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Write, inspect and run codeml control files",
    propagate_version = true
)]
struct Cli {
    /// Settings file applied on top of `.codeml.toml`
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write or inspect control files
    Ctl(CtlArgs),
    /// Parse a codeml results report
    Parse(ParseArgs),
    /// Run codeml on a control file
    Run(RunArgs),
}

#[derive(Args)]
struct CtlArgs {
    #[command(subcommand)]
    command: CtlCommand,
}

#[derive(Subcommand)]
enum CtlCommand {
    /// Write a control file from default options plus overrides
    Write(WriteArgs),
    /// Print the options and paths a control file sets
    Show(ShowArgs),
}

#[derive(Args)]
struct WriteArgs {
    /// Sequence alignment file
    #[arg(long, value_name = "PATH")]
    alignment: PathBuf,
    /// Tree file
    #[arg(long, value_name = "PATH")]
    tree: PathBuf,
    /// Results file the engine will write
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
    /// Override an option (repeatable); `KEY=None` leaves it out
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_assignment, action = ArgAction::Append)]
    set: Vec<(String, String)>,
    /// Control file to write (defaults to the configured location)
    #[arg(long, value_name = "PATH")]
    ctl: Option<PathBuf>,
    /// Directory the engine will run in
    #[arg(long = "working-dir", value_name = "DIR")]
    working_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ShowArgs {
    /// Control file to read
    #[arg(value_name = "CTL")]
    ctl: PathBuf,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
}

#[derive(Args)]
struct ParseArgs {
    /// Results report written by codeml
    #[arg(value_name = "REPORT")]
    report: PathBuf,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
}

#[derive(Args)]
struct RunArgs {
    /// Control file describing the job
    #[arg(value_name = "CTL")]
    ctl: PathBuf,
    /// Directory to run in (defaults to the control file's directory)
    #[arg(long = "working-dir", value_name = "DIR")]
    working_dir: Option<PathBuf>,
    /// Engine executable, overriding the configured one
    #[arg(long, value_name = "PROGRAM")]
    command: Option<String>,
    /// Let the engine print to the terminal
    #[arg(long)]
    verbose: bool,
    /// Skip parsing the results file
    #[arg(long = "no-parse")]
    no_parse: bool,
    /// Output format for parsed results
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatValue {
    Plain,
    Json,
}

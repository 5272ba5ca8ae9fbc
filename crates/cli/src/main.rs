use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::Path;

use lnt_formats_core::config::{config_path, load_config, AppConfig};
use lnt_formats_core::{guess_format, registry, Input};

#[derive(Parser)]
#[command(name = "lnt-formats")]
#[command(about = "Detect and convert LNT test-report files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered report formats
    Formats,

    /// Guess the format of report files
    Detect {
        /// Input file(s)
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Read a report in one format and write it in another
    Convert {
        /// Input file ('-' for stdin)
        #[arg(required = true)]
        input: String,

        /// Output file ('-' or omitted for stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Input format name, or <auto> to detect
        #[arg(long)]
        from: Option<String>,

        /// Output format name
        #[arg(long)]
        to: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize default config file
    Init,
    /// Show current configuration
    Show,
    /// Print the config file location
    Path,
}

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Formats => run_formats(cli.json),
        Commands::Detect { inputs } => run_detect(inputs, cli.json),
        Commands::Convert { input, output, from, to } => {
            run_convert(input, output.as_deref(), from.as_deref(), to.as_deref(), cli.json)
        }
        Commands::Config { action } => run_config(action, cli.json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_formats(json: bool) -> CliResult {
    let formats = registry().formats();
    if json {
        let listing: Vec<_> = formats
            .iter()
            .map(|f| {
                serde_json::json!({
                    "name": f.name(),
                    "read": f.can_read(),
                    "write": f.can_write(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for f in formats {
            let mut caps = Vec::new();
            if f.can_read() {
                caps.push("read");
            }
            if f.can_write() {
                caps.push("write");
            }
            println!("{}\t{}", f.name(), caps.join(", "));
        }
    }
    Ok(())
}

fn run_detect(inputs: &[String], json: bool) -> CliResult {
    let mut results = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if !path.is_file() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
        let guessed = guess_format(&mut Input::path(path))?.map(|f| f.name());
        results.push((input.as_str(), guessed));
    }

    if json {
        let listing: Vec<_> = results
            .iter()
            .map(|(input, format)| serde_json::json!({ "input": input, "format": format }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for (input, format) in &results {
            println!("{}: {}", input, format.unwrap_or("unknown"));
        }
    }
    Ok(())
}

fn run_convert(
    input: &str,
    output: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> CliResult {
    let config = load_config();
    let from = from.unwrap_or(&config.convert.input_format);
    let to = to.unwrap_or(&config.convert.output_format);
    tracing::debug!(input, from, to, "converting");

    // Everything is rendered into memory first so a failed conversion
    // never leaves a truncated output file behind.
    let mut rendered = Vec::new();
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        let mut stdin = Cursor::new(buf);
        registry().convert(&mut Input::stream(&mut stdin), from, &mut rendered, to)?;
    } else {
        let path = Path::new(input);
        if !path.is_file() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
        registry().convert(&mut Input::path(path), from, &mut rendered, to)?;
    }

    match output {
        Some(out) if out != "-" => {
            let mut file = BufWriter::new(File::create(out)?);
            file.write_all(&rendered)?;
            file.flush()?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "input": input, "output": out, "format": to })
                );
            } else {
                println!("Converted: {} -> {} ({})", input, out, to);
            }
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&rendered)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn run_config(action: &ConfigAction, json: bool) -> CliResult {
    match action {
        ConfigAction::Init => {
            let path = config_path().ok_or("Could not determine config directory")?;
            if path.exists() {
                return Err(format!("Config file already exists: {}", path.display()).into());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, AppConfig::default().to_toml()?)?;
            println!("Created: {}", path.display());
        }
        ConfigAction::Show => {
            let cfg = load_config();
            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else {
                print!("{}", cfg.to_toml()?);
            }
        }
        ConfigAction::Path => match config_path() {
            Some(path) => println!("{}", path.display()),
            None => return Err("Could not determine config directory".into()),
        },
    }
    Ok(())
}

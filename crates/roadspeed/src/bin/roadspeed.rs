use clap::{Parser, ValueEnum};
use log::LevelFilter;
use roadspeed::{write_json_line, ImageDirSource, Pipeline, PipelineConfig};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

#[derive(Parser, Debug)]
#[command(
    name = "roadspeed",
    version,
    about = "Estimate vehicle speeds from a directory of fixed-camera frames"
)]
struct Cli {
    /// Directory of frames; the first file by name must show the empty road.
    #[arg(required_unless_present = "print_config")]
    frames: Option<PathBuf>,

    /// Pipeline configuration (JSON). Missing fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write JSON-lines reports here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log verbosity. With the `tracing` build, `RUST_LOG` overrides it.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    {
        roadspeed::core::init_tracing(false, level.into());
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        roadspeed::core::init_with_level(level.into()).map_err(|e| e.to_string())?;
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(cli.log_level)?;

    let config = match &cli.config {
        Some(path) => PipelineConfig::load_json(path)?,
        None => PipelineConfig::default(),
    };

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    let Some(dir) = cli.frames else {
        return Err("missing frames directory".into());
    };

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut source = ImageDirSource::open(&dir)?;
    let mut pipeline = Pipeline::from_source(config, &mut source)?;
    let summary = pipeline.run(&mut source, |report| write_json_line(&mut out, report))?;
    out.flush()?;

    log::info!(
        "{} frames, {} vehicles seen",
        summary.frames,
        summary.tracks_created
    );
    Ok(())
}

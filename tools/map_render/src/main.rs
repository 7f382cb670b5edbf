use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use mapnik::{Config, Runtime, RuntimeConfig};
use std::path::PathBuf;

mod job;
mod render;

use job::{Output, RenderJob, Stylesheet};

const DEFAULT_SIZE: &str = "256";

fn cli() -> Command {
    Command::new("map_render")
        .about("Renders a Mapnik stylesheet to an image or UTF-grid")
        .arg(
            Arg::new("job")
                .short('j')
                .long("job")
                .value_name("FILE")
                .help("Render job file (.toml or .ron)")
                .conflicts_with_all(["stylesheet", "output"]),
        )
        .arg(
            Arg::new("stylesheet")
                .short('s')
                .long("stylesheet")
                .value_name("FILE")
                .help("Stylesheet XML file"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PIXELS")
                .help("Image width")
                .default_value(DEFAULT_SIZE),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PIXELS")
                .help("Image height")
                .default_value(DEFAULT_SIZE),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output image; the engine picks the format from the extension"),
        )
        .arg(
            Arg::new("library")
                .long("library")
                .value_name("PATH")
                .help("Mapnik C API shared library"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Override the log level"),
        )
        .arg(
            Arg::new("version")
                .short('V')
                .long("version")
                .help("Print the Mapnik engine version and exit")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Build the job from a job file or from the individual flags
fn job_from_matches(matches: &ArgMatches) -> Result<RenderJob> {
    let mut job = if let Some(path) = matches.get_one::<String>("job") {
        RenderJob::load_from_file(path).with_context(|| format!("Failed to read job file {path}"))?
    } else {
        let stylesheet = matches
            .get_one::<String>("stylesheet")
            .context("Either --job or --stylesheet is required")?;
        let output = matches
            .get_one::<String>("output")
            .context("--output is required with --stylesheet")?;

        RenderJob {
            width: parse_size(matches, "width")?,
            height: parse_size(matches, "height")?,
            stylesheet: Stylesheet::File(PathBuf::from(stylesheet)),
            output: Output::File {
                path: PathBuf::from(output),
            },
            ..RenderJob::default()
        }
    };

    if let Some(library) = matches.get_one::<String>("library") {
        job.runtime.library_path = Some(PathBuf::from(library));
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        job.log_level.clone_from(level);
    }

    job.validate().context("Invalid render job")?;
    Ok(job)
}

fn parse_size(matches: &ArgMatches, name: &str) -> Result<u32> {
    let raw = matches.get_one::<String>(name).map_or(DEFAULT_SIZE, String::as_str);
    raw.parse().with_context(|| format!("Invalid --{name} {raw:?}"))
}

fn init_logging(level: &str) {
    // RUST_LOG, when set, wins over the job's level
    env_logger::Builder::new()
        .filter_level(level.parse().unwrap_or(log::LevelFilter::Info))
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    if matches.get_flag("version") {
        init_logging("warn");
        let mut config = RuntimeConfig::default().with_strict_registration(false);
        config.library_path = matches.get_one::<String>("library").map(PathBuf::from);
        let runtime = Runtime::init(&config).context("Failed to load Mapnik")?;
        println!("{}", runtime.version());
        return Ok(());
    }

    let job = job_from_matches(&matches)?;
    init_logging(&job.log_level);

    log::info!("Rendering {}x{} to {}", job.width, job.height, job.output.path().display());
    let runtime = Runtime::init(&job.runtime).context("Failed to initialize Mapnik")?;
    render::render(&runtime, &job)
}

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use frame_features::analysis::{FeatureExtractor, FeatureVector, FrameAnalysis};
use frame_features::config::AppConfig;
use frame_features::fixtures::{ExpectationDiff, FixtureCatalog, FixtureProcessor};
use frame_features::frame::Frame;
use frame_features::osc::OscSender;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "frame_features_cli",
    about = "Frame feature extraction harness: analyze images, check fixtures, send OSC"
)]
struct Cli {
    /// Override directory containing fixture assets (defaults to the bundled fixtures/)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// Log debug events to stderr
    #[arg(long, short)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze an image file and print the feature report
    Analyze {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write visualization artifacts as PNG files into this directory
        #[arg(long)]
        artifacts: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a fixture and optionally compare against expectations
    Fixture {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List available fixtures on disk
    DumpFixtures,
    /// Analyze an image and send the features as OSC over UDP
    Send {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_else(FixtureCatalog::default);

    match cli.command {
        Commands::Analyze {
            image,
            config,
            artifacts,
            output,
        } => run_analyze(&image, config, artifacts, output),
        Commands::Fixture {
            fixture,
            expect,
            output,
            config,
        } => run_fixture(&catalog, &fixture, expect, output, config),
        Commands::DumpFixtures => run_dump(&catalog),
        Commands::Send {
            image,
            config,
            host,
            port,
        } => run_send(&image, config, host, port),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn load_frame(path: &Path, config: &AppConfig) -> Result<Frame> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let frame = Frame::decode(&bytes).with_context(|| format!("decoding {}", path.display()))?;
    match config.input.resize_to {
        Some([width, height]) if (width, height) != (frame.width(), frame.height()) => frame
            .resized(width, height)
            .with_context(|| format!("resizing {} to {width}x{height}", path.display())),
        _ => Ok(frame),
    }
}

fn run_analyze(
    image: &Path,
    config: Option<PathBuf>,
    artifacts: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let config = load_config(config)?;
    let frame = load_frame(image, &config)?;
    let extractor = FeatureExtractor::new(config.analysis)?;
    let analysis = extractor.analyze(&frame);

    if let Some(dir) = artifacts {
        save_artifacts(&dir, &analysis)?;
    }

    let source = image.display().to_string();
    emit_report(&source, &frame, &analysis.features, output_path)?;
    Ok(ExitCode::from(0))
}

fn run_fixture(
    catalog: &FixtureCatalog,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<ExitCode> {
    let config = load_config(config)?;
    let processor = FixtureProcessor::new(config.analysis)?;
    let data = catalog.load(fixture, override_expect)?;
    let actual = processor.run(&data);

    emit_report(&data.metadata.name, &data.frame, &actual, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&actual) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn run_send(
    image: &Path,
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<ExitCode> {
    let mut config = load_config(config)?;
    if let Some(host) = host {
        config.osc.host = host;
    }
    if let Some(port) = port {
        if port == 0 {
            bail!("--port must be non-zero");
        }
        config.osc.port = port;
    }

    let frame = load_frame(image, &config)?;
    let extractor = FeatureExtractor::new(config.analysis.clone())?;
    let features = extractor.extract(&frame);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    let sent = runtime.block_on(async {
        let sender = OscSender::connect(&config.osc.host, config.osc.port).await?;
        sender.send_features(&features, &config.osc).await
    })?;

    eprintln!(
        "Sent {sent} messages to {}:{}",
        config.osc.host, config.osc.port
    );
    Ok(ExitCode::from(0))
}

fn save_artifacts(dir: &Path, analysis: &FrameAnalysis) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let artifacts = [
        ("clustered.png", &analysis.clustered),
        ("color_bar.png", &analysis.color_bar),
        ("centroid_debug.png", &analysis.centroid_debug),
        ("spectrum.png", &analysis.spectrum),
        ("laplacian.png", &analysis.laplacian),
    ];
    for (name, frame) in artifacts {
        let path = dir.join(name);
        frame
            .to_rgb_image()
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn emit_report(
    source: &str,
    frame: &Frame,
    features: &FeatureVector,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let report = FeatureReportPayload {
        source,
        width: frame.width(),
        height: frame.height(),
        features,
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct FeatureReportPayload<'a> {
    source: &'a str,
    width: u32,
    height: u32,
    features: &'a FeatureVector,
}

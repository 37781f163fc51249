use std::{error::Error, fs, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use slice_review::{
    config::ViewerConfig,
    enums::RenderMode,
    session::{RenderedFrame, ViewerSession},
};
use web_time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Plain,
    Overlay,
    SideBySide,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Plain => RenderMode::Plain,
            Mode::Overlay => RenderMode::Overlay,
            Mode::SideBySide => RenderMode::SideBySide,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "Render a DICOM series and its segmentation masks to PNG frames")]
struct Cli {
    /// Folder containing the DICOM slices
    slices: PathBuf,

    /// Folder containing masks named by instance number (decimal or hex)
    #[arg(long)]
    masks: Option<PathBuf>,

    #[arg(long, default_value = "frames")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = Mode::Plain)]
    mode: Mode,

    /// JSON file overriding the viewer defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Advance through the frames with the autoplay timer
    #[arg(long)]
    play: bool,

    /// Print the readout under this source pixel on every frame, as X,Y
    #[arg(long, value_parser = parse_point)]
    probe: Option<(f64, f64)>,
}

fn parse_point(value: &str) -> Result<(f64, f64), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid coordinate `{part}`: {err}"))
    };
    Ok((parse(x)?, parse(y)?))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => ViewerConfig::from_json_file(path)?,
        None => ViewerConfig::default(),
    };
    let mut session = ViewerSession::new(config);
    let summary = session.load_from_directories(&cli.slices, cli.masks.as_deref())?;
    if let Some(warning) = summary.count_mismatch {
        log::warn!("{warning}, frames without a mask cannot be composited");
    }

    fs::create_dir_all(&cli.output)?;
    let mode = RenderMode::from(cli.mode);

    if cli.play {
        session.playback_mut().play_at(Instant::now());
        export_current(&session, mode, &cli)?;
        while let Some(deadline) = session.playback().next_tick() {
            tokio::time::sleep(deadline.saturating_duration_since(Instant::now())).await;
            if session.playback_mut().poll_at(Instant::now()) {
                export_current(&session, mode, &cli)?;
            }
        }
    } else {
        for index in 0..session.study().len() {
            session.playback_mut().set_index(index);
            export_current(&session, mode, &cli)?;
        }
    }
    Ok(())
}

fn export_current(session: &ViewerSession, mode: RenderMode, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let index = session.playback().current_index();
    log::info!("{}", session.title());

    if let (Some((x, y)), Some(frame)) = (cli.probe, session.current_frame()) {
        // Probe in source pixels: display at native size
        let (height, width) = frame.slice.dim();
        match session.readout(x, y, width as f64, height as f64) {
            Some(readout) => println!("{readout}"),
            None => println!("Slice {} | probe outside image", index + 1),
        }
    }

    match session.render(mode) {
        Ok(RenderedFrame::Plain(image)) | Ok(RenderedFrame::Overlay(image)) => {
            image.save(cli.output.join(format!("{index:04}.png")))?;
        }
        Ok(RenderedFrame::SideBySide { slice, mask }) => {
            slice.save(cli.output.join(format!("{index:04}_slice.png")))?;
            mask.save(cli.output.join(format!("{index:04}_mask.png")))?;
        }
        Err(err) => log::warn!("Skipping frame {}: {err}", index + 1),
    }
    Ok(())
}

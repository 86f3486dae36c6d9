pub mod app;
pub mod components;
pub mod encoder;
pub mod error;
pub mod format;
pub mod fstools;
pub mod headless;
pub mod lines;
pub mod logging;
pub mod planner;
pub mod quality;
pub mod runner;
pub mod session;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rustop::opts;
use tracing::{error, info, warn};

use app::App;
use encoder::Encoder;
use error::{ConvertError, Result};
use format::TargetFormat;
use logging::{init_logging, LogConfig};
use planner::{plan_with_encoder, ConversionRequest};
use quality::Quality;
use runner::TaskRunner;
use session::Session;

const PROGRAM_NAME: &str = "media-convert";

fn main() -> ExitCode {
    let (args, _rest) = opts! {
        synopsis "Convert a media file with ffmpeg. Interactive unless --headless or --dry-run is given.";
        opt headless:bool=false, desc:"Convert INPUT without the interactive screen.";
        opt dry_run:bool=false, desc:"Print the encoder command for INPUT and exit.";
        opt json:bool=false, desc:"Print the dry-run command as JSON. Requires --dry-run.";
        opt format:String=String::from("mp3"), desc:"Output format. [mp3, opus, wav, flac, webm, mp4]";
        opt quality:String=String::from("Balanced"), desc:"Quality preset. [High quality, Balanced, Smaller file]";
        opt output_dir:Option<String>, desc:"Output folder. Defaults to the input's folder.";
        opt encoder:String=String::from(planner::DEFAULT_ENCODER), desc:"Encoder binary, looked up on PATH.";
        opt log_level:String=String::from("info"), desc:"Log level. [error, warn, info, debug, trace]";
        opt log_dir:Option<String>, desc:"Folder for the log file. Defaults to the system temp folder.";
        param input:Option<String>, desc:"Input media file";
    }.parse_or_exit();

    if let Err(err) = check_modes(args.dry_run, args.json) {
        return fail(err);
    }
    let format: TargetFormat = match args.format.parse() {
        Ok(format) => format,
        Err(err) => return fail(err),
    };
    let quality: Quality = match args.quality.parse() {
        Ok(quality) => quality,
        Err(err) => return fail(err),
    };

    let mut log_config = LogConfig::default()
        .with_level(&args.log_level)
        .with_stderr(args.headless || args.dry_run);
    if let Some(dir) = &args.log_dir {
        log_config = log_config.with_log_dir(dir);
    }
    let log_file = match init_logging(PROGRAM_NAME, log_config) {
        Ok(path) => path,
        Err(err) => return fail(err),
    };

    let input = args.input.as_ref().map(PathBuf::from);
    let output_dir = args.output_dir.as_ref().map(PathBuf::from);

    let result = if args.dry_run {
        dry_run(input, output_dir, format, quality, &args.encoder, args.json)
    } else if args.headless {
        headless(input, output_dir, format, quality, &args.encoder)
    } else {
        interactive(input, output_dir, format, quality, &args.encoder, &log_file)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}

fn fail(err: ConvertError) -> ExitCode {
    error!(error = %err, "exiting with failure");
    eprintln!("{}", err);
    ExitCode::FAILURE
}

fn check_modes(dry_run: bool, json: bool) -> Result<()> {
    if json && !dry_run {
        return Err(ConvertError::InvalidInput(String::from("--json only applies together with --dry-run")));
    }
    Ok(())
}

fn default_output_dir(input: &PathBuf) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn dry_run(input: Option<PathBuf>, output_dir: Option<PathBuf>, format: TargetFormat, quality: Quality, encoder: &str, json: bool) -> Result<()> {
    let input = input.ok_or_else(ConvertError::no_input_selected)?;
    let output_dir = output_dir.unwrap_or_else(|| default_output_dir(&input));
    let command = plan_with_encoder(&ConversionRequest::unchecked(input, output_dir, format, quality), encoder);
    if json {
        println!("{}", serde_json::to_string_pretty(&command.report())?);
    } else {
        println!("{}", command.display_line());
    }
    Ok(())
}

fn headless(input: Option<PathBuf>, output_dir: Option<PathBuf>, format: TargetFormat, quality: Quality, encoder: &str) -> Result<()> {
    let input = input.ok_or_else(ConvertError::no_input_selected)?;
    let mut session = Session::new(default_output_dir(&input)).encoder(encoder);
    session.select_input(input);
    if let Some(dir) = output_dir {
        session.select_output_dir(dir);
    }
    session.format = format;
    session.quality = quality;

    headless::convert(&mut session, &TaskRunner::new()).map(|_| ())
}

fn interactive(input: Option<PathBuf>, output_dir: Option<PathBuf>, format: TargetFormat, quality: Quality, encoder: &str, log_file: &PathBuf) -> Result<()> {
    let tool = Encoder::new(encoder);
    match tool.version() {
        Some(version) => info!(%version, "encoder found"),
        None => warn!(encoder, "encoder not found on PATH; conversions will fail until it is installed"),
    }

    // SIGTERM/SIGINT end the event loop so the terminal is restored
    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;

    let cwd = std::env::current_dir()?;
    let mut session = Session::new(cwd).encoder(encoder);
    if let Some(path) = input {
        session.select_input(path);
    }
    if let Some(dir) = output_dir {
        session.select_output_dir(dir);
    }
    session.format = format;
    session.quality = quality;

    let terminal = ratatui::init();
    let result = App::new(session, stop).run(terminal);
    ratatui::restore();

    info!(log_file = %log_file.display(), "interactive session ended");
    result
}

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{ConvertError, Result};
use crate::format::TargetFormat;
use crate::fstools::{classify_file, file_size, DirEntryCategory};
use crate::planner::{plan_with_encoder, ConversionCommand, ConversionRequest, DEFAULT_ENCODER};
use crate::quality::Quality;
use crate::runner::{RunnerEvent, TaskOutcome};

pub const IDLE_STATUS: &str = "Pick a file, pick a format, convert it.";
pub const RUNNING_STATUS: &str = "Converting... keep this open until it finishes.";
pub const SUCCESS_STATUS: &str = "File converted.";
pub const FAILURE_STATUS: &str = "Conversion failed. See the log for the encoder's output.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
}

/// A blocking message the front-end shows before anything else happens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Everything the conversion screen shows. Owned by the UI thread; runner
/// output only reaches it through [`Session::apply`].
#[derive(Clone, Debug)]
pub struct Session {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: TargetFormat,
    pub quality: Quality,
    pub encoder: String,
    pub status: SessionStatus,
    pub status_text: String,
    pub log: Vec<String>,
    pub converted: usize,
    pub notification: Option<Notification>,
    current_output: Option<PathBuf>,
}

impl Session {
    pub fn new(output_dir: PathBuf) -> Self {
        Session {
            input: None,
            output_dir: Some(output_dir),
            format: TargetFormat::default(),
            quality: Quality::default(),
            encoder: String::from(DEFAULT_ENCODER),
            status: SessionStatus::Idle,
            status_text: String::from(IDLE_STATUS),
            log: vec![],
            converted: 0,
            notification: None,
            current_output: None,
        }
    }

    pub fn encoder(mut self, encoder: &str) -> Self {
        self.encoder = String::from(encoder);
        self
    }

    pub fn is_busy(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Selects the input file; the output folder follows the input's folder.
    pub fn select_input(&mut self, path: PathBuf) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.output_dir = Some(parent.to_path_buf());
        }
        self.input = Some(path);
    }

    pub fn select_output_dir(&mut self, path: PathBuf) {
        self.output_dir = Some(path);
    }

    pub fn clear_output_dir(&mut self) {
        self.output_dir = None;
    }

    /// Validates the form and moves to Running, returning the command to
    /// hand to the runner. Invalid input raises a notification and leaves
    /// the session idle.
    pub fn start(&mut self) -> Result<ConversionCommand> {
        if self.is_busy() {
            return Err(ConvertError::InvalidInput(String::from("a conversion is already running")));
        }

        let request = match self.request() {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "conversion not started");
                self.notification = Some(notification_for(&err));
                return Err(err);
            },
        };

        let command = plan_with_encoder(&request, &self.encoder);
        self.append_log("");
        self.append_log("=== Starting conversion ===");
        self.append_log(&format!("Input:  {}", request.input().display()));
        self.append_log(&format!("Output: {}", command.output.display()));
        self.append_log("");

        self.status = SessionStatus::Running;
        self.status_text = String::from(RUNNING_STATUS);
        self.current_output = Some(command.output.clone());
        info!(input = %request.input().display(), format = %request.format(), quality = %request.quality(), "conversion started");
        Ok(command)
    }

    fn request(&self) -> Result<ConversionRequest> {
        let input = match &self.input {
            None => return Err(ConvertError::no_input_selected()),
            Some(input) => input.clone(),
        };
        let output_dir = match &self.output_dir {
            None => return Err(ConvertError::no_output_dir_selected()),
            Some(dir) => dir.clone(),
        };
        if classify_file(&output_dir) != DirEntryCategory::Directory {
            return Err(ConvertError::missing_output_dir(output_dir));
        }
        ConversionRequest::new(input, output_dir, self.format, self.quality)
    }

    pub fn apply(&mut self, event: RunnerEvent) {
        match event {
            RunnerEvent::Line(line) => self.append_log(&line),
            RunnerEvent::Finished(outcome) => self.finish(outcome),
        }
    }

    fn finish(&mut self, outcome: TaskOutcome) {
        self.status = SessionStatus::Idle;
        let output = self.current_output.take();
        self.append_log("");
        if outcome.succeeded {
            self.converted += 1;
            self.append_log("=== Conversion finished successfully ===");
            self.status_text = match output.as_deref().and_then(file_size) {
                Some(size) => format!("{} ({})", SUCCESS_STATUS, human_size(size)),
                None => String::from(SUCCESS_STATUS),
            };
        } else {
            match outcome.exit_code {
                Some(code) => self.append_log(&format!("=== Conversion failed (exit code {code}) ===")),
                None => self.append_log("=== Conversion failed ==="),
            }
            self.status_text = String::from(FAILURE_STATUS);
        }
        info!(succeeded = outcome.succeeded, converted = self.converted, "conversion finished");
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    fn append_log(&mut self, line: &str) {
        self.log.push(String::from(line));
    }
}

fn notification_for(err: &ConvertError) -> Notification {
    let title = match err {
        ConvertError::InvalidInput(reason) if reason.starts_with("output") => "Invalid output",
        ConvertError::InvalidInput(_) => "No input",
        _ => "Error",
    };
    let message = match err {
        ConvertError::InvalidInput(reason) => reason.clone(),
        other => other.to_string(),
    };
    Notification {
        title: String::from(title),
        message,
    }
}

pub fn human_size(bytes: u64) -> String {
    use human_repr::HumanCount;
    bytes.human_count_bytes().to_string()
}

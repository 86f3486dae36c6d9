use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ConvertError, Result};
use crate::format::TargetFormat;
use crate::fstools::{classify_file, DirEntryCategory};
use crate::quality::Quality;

pub const DEFAULT_ENCODER: &str = "ffmpeg";

#[derive(Clone, Debug, PartialEq)]
pub struct ConversionRequest {
    input: PathBuf,
    output_dir: PathBuf,
    format: TargetFormat,
    quality: Quality,
}

impl ConversionRequest {
    /// Builds a request, checking that `input` is an existing file and
    /// `output_dir` an existing directory.
    pub fn new(input: PathBuf, output_dir: PathBuf, format: TargetFormat, quality: Quality) -> Result<Self> {
        if classify_file(&input) != DirEntryCategory::RegularFile {
            return Err(ConvertError::missing_input(input));
        }
        if classify_file(&output_dir) != DirEntryCategory::Directory {
            return Err(ConvertError::missing_output_dir(output_dir));
        }
        Ok(ConversionRequest::unchecked(input, output_dir, format, quality))
    }

    /// Builds a request without touching the filesystem.
    pub fn unchecked(input: PathBuf, output_dir: PathBuf, format: TargetFormat, quality: Quality) -> Self {
        ConversionRequest { input, output_dir, format, quality }
    }

    pub fn input(&self) -> &Path { &self.input }

    pub fn output_dir(&self) -> &Path { &self.output_dir }

    pub fn format(&self) -> TargetFormat { self.format }

    pub fn quality(&self) -> Quality { self.quality }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConversionCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub output: PathBuf,
}

impl ConversionCommand {
    /// The command as one line, quoting arguments that contain whitespace.
    pub fn display_line(&self) -> String {
        let mut parts = vec![quote(&self.program)];
        parts.extend(self.args.iter().map(|a| quote(a)));
        parts.join(" ")
    }

    /// The folder the output is written to; the encoder runs there.
    pub fn working_dir(&self) -> &Path {
        match self.output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn report(&self) -> PlanReport {
        PlanReport {
            program: self.program.to_string_lossy().into_owned(),
            args: self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect(),
            output: self.output.display().to_string(),
        }
    }
}

/// Serializable view of a planned command, printed by `--dry-run --json`.
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub program: String,
    pub args: Vec<String>,
    pub output: String,
}

fn quote(s: &OsStr) -> String {
    let s = s.to_string_lossy();
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("{:?}", s)
    } else {
        s.into_owned()
    }
}

pub fn plan(request: &ConversionRequest) -> ConversionCommand {
    plan_with_encoder(request, DEFAULT_ENCODER)
}

pub fn plan_with_encoder(request: &ConversionRequest, encoder: &str) -> ConversionCommand {
    let output = generate_output_filename(request.input(), request.output_dir(), request.format());

    let mut args: Vec<OsString> = vec![
        OsString::from("-y"),
        OsString::from("-i"),
        request.input().as_os_str().to_owned(),
    ];
    args.extend(Quality::parameters(request.format(), request.quality()).into_iter().map(OsString::from));
    args.push(output.as_os_str().to_owned());

    ConversionCommand {
        program: OsString::from(encoder),
        args,
        output,
    }
}

fn generate_output_filename(input: &Path, output_dir: &Path, format: TargetFormat) -> PathBuf {
    let mut file_name = input.file_stem().map(OsStr::to_owned).unwrap_or_default();
    file_name.push(".");
    file_name.push(format.extension());
    output_dir.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(command: &ConversionCommand) -> Vec<String> {
        command.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn flags_for(format: TargetFormat, quality: Quality) -> Vec<String> {
        let request = ConversionRequest::unchecked(PathBuf::from("/in/clip.mkv"), PathBuf::from("/out"), format, quality);
        let args = args_of(&plan(&request));
        args[3..args.len() - 1].to_vec()
    }

    #[test]
    fn test_concrete_scenario() {
        let request = ConversionRequest::unchecked(
            PathBuf::from("/tmp/a.wav"),
            PathBuf::from("/tmp/out"),
            TargetFormat::Mp3,
            Quality::High);
        let command = plan(&request);
        assert_eq!(command.program, OsString::from("ffmpeg"));
        assert_eq!(command.output, PathBuf::from("/tmp/out/a.mp3"));
        assert_eq!(
            command.display_line(),
            "ffmpeg -y -i /tmp/a.wav -vn -c:a libmp3lame -b:a 320k /tmp/out/a.mp3");
    }

    #[test]
    fn test_flag_table() {
        let table: [(TargetFormat, Quality, &str); 18] = [
            (TargetFormat::Mp3, Quality::High, "-vn -c:a libmp3lame -b:a 320k"),
            (TargetFormat::Mp3, Quality::Balanced, "-vn -c:a libmp3lame -b:a 192k"),
            (TargetFormat::Mp3, Quality::Smaller, "-vn -c:a libmp3lame -b:a 128k"),
            (TargetFormat::Opus, Quality::High, "-vn -c:a libopus -b:a 192k"),
            (TargetFormat::Opus, Quality::Balanced, "-vn -c:a libopus -b:a 128k"),
            (TargetFormat::Opus, Quality::Smaller, "-vn -c:a libopus -b:a 96k"),
            (TargetFormat::Wav, Quality::High, "-vn -c:a pcm_s16le"),
            (TargetFormat::Wav, Quality::Balanced, "-vn -c:a pcm_s16le"),
            (TargetFormat::Wav, Quality::Smaller, "-vn -c:a pcm_s16le"),
            (TargetFormat::Flac, Quality::High, "-vn -c:a flac"),
            (TargetFormat::Flac, Quality::Balanced, "-vn -c:a flac"),
            (TargetFormat::Flac, Quality::Smaller, "-vn -c:a flac"),
            (TargetFormat::Webm, Quality::High, "-c:v libvpx-vp9 -c:a libopus -b:v 0 -crf 20"),
            (TargetFormat::Webm, Quality::Balanced, "-c:v libvpx-vp9 -c:a libopus -b:v 0 -crf 28"),
            (TargetFormat::Webm, Quality::Smaller, "-c:v libvpx-vp9 -c:a libopus -b:v 0 -crf 32"),
            (TargetFormat::Mp4, Quality::High, "-c:v libx264 -c:a aac -crf 18 -preset slow"),
            (TargetFormat::Mp4, Quality::Balanced, "-c:v libx264 -c:a aac -crf 23 -preset medium"),
            (TargetFormat::Mp4, Quality::Smaller, "-c:v libx264 -c:a aac -crf 28 -preset faster"),
        ];
        for (format, quality, expected) in table {
            assert_eq!(flags_for(format, quality).join(" "), expected, "{format} / {quality}");
        }
    }

    #[test]
    fn test_command_shape() {
        let request = ConversionRequest::unchecked(PathBuf::from("in.mov"), PathBuf::from("out"), TargetFormat::Mp4, Quality::Smaller);
        let args = args_of(&plan(&request));
        assert_eq!(&args[..3], &["-y", "-i", "in.mov"]);
        assert_eq!(args.last().map(String::as_str), Some("out/in.mp4"));
    }

    #[test]
    fn test_generate_output_filename() {
        assert_eq!(
            generate_output_filename(Path::new("/a/b/c/d/song.final.flac"), Path::new("/music"), TargetFormat::Opus),
            PathBuf::from("/music/song.final.opus"));
        assert_eq!(
            generate_output_filename(Path::new("relative/clip"), Path::new("/out"), TargetFormat::Webm),
            PathBuf::from("/out/clip.webm"));
        assert_eq!(
            generate_output_filename(Path::new("movie.mp4"), Path::new("/out"), TargetFormat::Mp4),
            PathBuf::from("/out/movie.mp4"));
    }

    #[test]
    fn test_custom_encoder() {
        let request = ConversionRequest::unchecked(PathBuf::from("a.wav"), PathBuf::from("."), TargetFormat::Wav, Quality::High);
        assert_eq!(plan_with_encoder(&request, "/opt/ffmpeg/bin/ffmpeg").program, OsString::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn test_display_line_quotes_spaces() {
        let request = ConversionRequest::unchecked(PathBuf::from("/x/my song.wav"), PathBuf::from("/y"), TargetFormat::Flac, Quality::High);
        assert_eq!(
            plan(&request).display_line(),
            "ffmpeg -y -i \"/x/my song.wav\" -vn -c:a flac \"/y/my song.flac\"");
    }

    #[test]
    fn test_report_serializes() {
        let request = ConversionRequest::unchecked(PathBuf::from("/tmp/a.wav"), PathBuf::from("/tmp/out"), TargetFormat::Wav, Quality::High);
        let json = serde_json::to_value(plan(&request).report()).unwrap();
        assert_eq!(json["program"], "ffmpeg");
        assert_eq!(json["output"], "/tmp/out/a.wav");
        assert_eq!(json["args"][0], "-y");
    }

    #[test]
    fn test_request_validation() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.wav");
        std::fs::write(&input, b"").unwrap();

        assert!(ConversionRequest::new(input.clone(), dir.path().to_path_buf(), TargetFormat::Mp3, Quality::High).is_ok());
        assert!(matches!(
            ConversionRequest::new(dir.path().join("missing.wav"), dir.path().to_path_buf(), TargetFormat::Mp3, Quality::High),
            Err(ConvertError::InvalidInput(_))));
        assert!(matches!(
            ConversionRequest::new(input, dir.path().join("missing"), TargetFormat::Mp3, Quality::High),
            Err(ConvertError::InvalidInput(_))));
    }
}

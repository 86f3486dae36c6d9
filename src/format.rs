use std::fmt::Display;
use std::str::FromStr;

use crate::error::ConvertError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetFormat {
    Mp3,
    Opus,
    Wav,
    Flac,
    Webm,
    Mp4,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 6] = [
        TargetFormat::Mp3,
        TargetFormat::Opus,
        TargetFormat::Wav,
        TargetFormat::Flac,
        TargetFormat::Webm,
        TargetFormat::Mp4,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Mp3 => "mp3",
            TargetFormat::Opus => "opus",
            TargetFormat::Wav => "wav",
            TargetFormat::Flac => "flac",
            TargetFormat::Webm => "webm",
            TargetFormat::Mp4 => "mp4",
        }
    }

    /// Audio targets drop the video stream (`-vn`).
    pub fn is_audio(self) -> bool {
        matches!(self, TargetFormat::Mp3 | TargetFormat::Opus | TargetFormat::Wav | TargetFormat::Flac)
    }

    pub fn next(self) -> Self {
        let i = TargetFormat::ALL.iter().position(|f| *f == self).unwrap_or(0);
        TargetFormat::ALL[(i + 1) % TargetFormat::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let len = TargetFormat::ALL.len();
        let i = TargetFormat::ALL.iter().position(|f| *f == self).unwrap_or(0);
        TargetFormat::ALL[(i + len - 1) % len]
    }
}

impl Default for TargetFormat {
    fn default() -> Self {
        TargetFormat::Mp3
    }
}

impl FromStr for TargetFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        TargetFormat::ALL
            .into_iter()
            .find(|f| f.extension() == lower)
            .ok_or_else(|| ConvertError::InvalidInput(format!("unsupported output format {s:?}")))
    }
}

impl Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", TargetFormat::Mp3), "mp3");
        assert_eq!(format!("{}", TargetFormat::Webm), "webm");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("FLAC".parse::<TargetFormat>().unwrap(), TargetFormat::Flac);
        assert_eq!(" opus ".parse::<TargetFormat>().unwrap(), TargetFormat::Opus);
        assert!("mkv".parse::<TargetFormat>().is_err());
    }

    #[test]
    fn test_is_audio() {
        let audio: Vec<TargetFormat> = TargetFormat::ALL.into_iter().filter(|f| f.is_audio()).collect();
        assert_eq!(audio, vec![TargetFormat::Mp3, TargetFormat::Opus, TargetFormat::Wav, TargetFormat::Flac]);
    }

    #[test]
    fn test_cycle() {
        assert_eq!(TargetFormat::Mp4.next(), TargetFormat::Mp3);
        assert_eq!(TargetFormat::Mp3.prev(), TargetFormat::Mp4);
        assert_eq!(TargetFormat::Wav.next(), TargetFormat::Flac);
    }
}

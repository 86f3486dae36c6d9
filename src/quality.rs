use std::fmt::Display;
use std::str::FromStr;

use crate::error::ConvertError;
use crate::format::TargetFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    High,
    Balanced,
    Smaller,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::High, Quality::Balanced, Quality::Smaller];

    /// The label shown in the quality selector. `from_str` matches these exactly.
    pub fn label(self) -> &'static str {
        match self {
            Quality::High => "High quality",
            Quality::Balanced => "Balanced",
            Quality::Smaller => "Smaller file",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Quality::High => Quality::Balanced,
            Quality::Balanced => Quality::Smaller,
            Quality::Smaller => Quality::High,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Quality::High => Quality::Smaller,
            Quality::Balanced => Quality::High,
            Quality::Smaller => Quality::Balanced,
        }
    }

    /// Encoder flags for `format` at this quality: the codec bundle first,
    /// then the tier-specific flags.
    pub fn parameters(format: TargetFormat, quality: Quality) -> Vec<String> {
        match format {
            TargetFormat::Mp3 => mp3_parameters(quality),
            TargetFormat::Opus => opus_parameters(quality),
            TargetFormat::Wav => strs(&["-vn", "-c:a", "pcm_s16le"]),
            TargetFormat::Flac => strs(&["-vn", "-c:a", "flac"]),
            TargetFormat::Webm => webm_parameters(quality),
            TargetFormat::Mp4 => mp4_parameters(quality),
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Balanced
    }
}

impl FromStr for Quality {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::ALL
            .into_iter()
            .find(|q| q.label() == s)
            .ok_or_else(|| ConvertError::InvalidInput(format!("unknown quality preset {s:?}")))
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn strs(s: &[&str]) -> Vec<String> {
    s.iter().map(|s| String::from(*s)).collect()
}

fn mp3_parameters(quality: Quality) -> Vec<String> {
    let bitrate = match quality {
        Quality::High => "320k",
        Quality::Balanced => "192k",
        Quality::Smaller => "128k",
    };
    strs(&["-vn", "-c:a", "libmp3lame", "-b:a", bitrate])
}

fn opus_parameters(quality: Quality) -> Vec<String> {
    let bitrate = match quality {
        Quality::High => "192k",
        Quality::Balanced => "128k",
        Quality::Smaller => "96k",
    };
    strs(&["-vn", "-c:a", "libopus", "-b:a", bitrate])
}

fn webm_parameters(quality: Quality) -> Vec<String> {
    let crf = match quality {
        Quality::High => "20",
        Quality::Balanced => "28",
        Quality::Smaller => "32",
    };
    strs(&["-c:v", "libvpx-vp9", "-c:a", "libopus", "-b:v", "0", "-crf", crf])
}

fn mp4_parameters(quality: Quality) -> Vec<String> {
    let (crf, preset) = match quality {
        Quality::High => ("18", "slow"),
        Quality::Balanced => ("23", "medium"),
        Quality::Smaller => ("28", "faster"),
    };
    strs(&["-c:v", "libx264", "-c:a", "aac", "-crf", crf, "-preset", preset])
}

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{ConvertError, Result};

/// The external encoder, looked up on the executable search path.
#[derive(Clone, Debug)]
pub struct Encoder {
    program: OsString,
}

impl Encoder {
    pub fn new(program: impl Into<OsString>) -> Self {
        Encoder { program: program.into() }
    }

    pub fn locate(&self) -> Result<PathBuf> {
        locate(&self.program)
    }

    /// First line of `-version`, when the encoder runs.
    pub fn version(&self) -> Option<String> {
        let path = self.locate().ok()?;
        let mut cmd = Command::new(path);
        cmd.arg("-version").stdin(Stdio::null());
        hide_console(&mut cmd);
        let output = cmd.output().ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(String::from)
    }
}

/// Resolves `program` the way the shell would: a bare name is searched on
/// PATH, a name with a path separator is checked as given.
pub fn locate(program: &OsStr) -> Result<PathBuf> {
    which::which(program).map_err(|_| ConvertError::encoder_not_found(program.to_string_lossy()))
}

/// Keeps the encoder from opening a console window on Windows.
#[cfg(windows)]
pub fn hide_console(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x08000000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
pub fn hide_console(_cmd: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_encoder() {
        let encoder = Encoder::new("nonexistent_encoder_12345");
        assert!(encoder.version().is_none());
        assert!(matches!(encoder.locate(), Err(ConvertError::EncoderNotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_on_path() {
        assert!(Encoder::new("sh").locate().is_ok());
    }
}

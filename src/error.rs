use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The encoder binary is not on the executable search path.
    #[error("{program} not found. Make sure it is installed and in PATH.")]
    EncoderNotFound { program: String },

    /// Rejected before anything is launched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The encoder ran and exited unsuccessfully. The partial output stays on disk.
    #[error("encoding failed{}", exit_suffix(.code))]
    EncodingFailure { code: Option<i32> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => String::new(),
    }
}

impl ConvertError {
    pub fn encoder_not_found(program: impl Into<String>) -> Self {
        Self::EncoderNotFound { program: program.into() }
    }

    pub fn no_input_selected() -> Self {
        Self::InvalidInput(String::from("no input file selected"))
    }

    pub fn no_output_dir_selected() -> Self {
        Self::InvalidInput(String::from("output folder not selected"))
    }

    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::InvalidInput(format!("input file {} does not exist", path.into().display()))
    }

    pub fn missing_output_dir(path: impl Into<PathBuf>) -> Self {
        Self::InvalidInput(format!("output folder {} does not exist", path.into().display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ConvertError::encoder_not_found("ffmpeg").to_string(),
            "ffmpeg not found. Make sure it is installed and in PATH."
        );
        assert_eq!(ConvertError::EncodingFailure { code: Some(1) }.to_string(), "encoding failed with exit code 1");
        assert_eq!(ConvertError::EncodingFailure { code: None }.to_string(), "encoding failed");
        assert_eq!(ConvertError::no_input_selected().to_string(), "invalid input: no input file selected");
    }
}

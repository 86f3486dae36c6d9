use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DirEntryCategory {
    DoesNotExist,
    RegularFile,
    Directory,
    Unknown,
}

/// Classifies `path`, following symlinks.
pub fn classify_file(path: &Path) -> DirEntryCategory {
    match fs::metadata(path) {
        Ok(metadata) => {
            if metadata.is_file() {
                DirEntryCategory::RegularFile
            } else if metadata.is_dir() {
                DirEntryCategory::Directory
            } else {
                DirEntryCategory::Unknown
            }
        },
        Err(_) => DirEntryCategory::DoesNotExist,
    }
}

pub fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.wav");
        fs::write(&file, b"RIFF").unwrap();

        assert_eq!(classify_file(dir.path()), DirEntryCategory::Directory);
        assert_eq!(classify_file(&file), DirEntryCategory::RegularFile);
        assert_eq!(classify_file(&dir.path().join("nope")), DirEntryCategory::DoesNotExist);
        assert_eq!(file_size(&file), Some(4));
    }
}

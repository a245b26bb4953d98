//! Test utilities for creating temporary log files.

#[cfg(test)]
use std::fs::{File, OpenOptions};
#[cfg(test)]
use std::io::Write;
#[cfg(test)]
use std::path::{Path, PathBuf};

#[cfg(test)]
pub struct TempLogFile {
    pub path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

#[cfg(test)]
impl TempLogFile {
    /// Create a new temporary log file for testing
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("game.log");

        // Create the file
        File::create(&path)?;

        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Create a temp dir whose log file does not exist yet
    pub fn pending() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("game.log");

        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Append one line (newline added) to the temporary log file
    pub fn append_line(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    /// Replace the file contents wholesale (simulate log rotation)
    pub fn replace_with(&self, lines: &[&str]) -> std::io::Result<()> {
        let mut file = File::create(&self.path)?;
        for line in lines {
            writeln!(file, "{}", line)?;
        }
        file.flush()?;
        Ok(())
    }

    /// Get the path to the temporary file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_log_file_creation() {
        let temp_file = TempLogFile::new().unwrap();
        assert!(temp_file.path().exists());
    }

    #[test]
    fn test_pending_file_does_not_exist() {
        let temp_file = TempLogFile::pending().unwrap();
        assert!(!temp_file.path().exists());
    }

    #[test]
    fn test_append_line() {
        let temp_file = TempLogFile::new().unwrap();
        temp_file.append_line("line 1").unwrap();
        temp_file.append_line("line 2").unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "line 1\nline 2\n");
    }

    #[test]
    fn test_replace_with() {
        let temp_file = TempLogFile::new().unwrap();
        temp_file.append_line("a much longer initial line").unwrap();
        temp_file.replace_with(&["short"]).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "short\n");
    }
}

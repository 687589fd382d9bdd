//! Ephemeral rate file: the latest sample as `"<download> <upload>\n"`,
//! so status bars and scripts can read it without talking to vpntop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::system::network::RateSample;

#[derive(Debug, Clone)]
pub struct RateFile {
    path: PathBuf,
}

impl RateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents with `rate`. Written to a sibling temp file and
    /// renamed so readers never see a half-written line.
    pub fn write(&self, rate: &RateSample) -> io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(
            &tmp,
            format!("{:.2} {:.2}\n", rate.download_mbps, rate.upload_mbps),
        )?;
        fs::rename(&tmp, &self.path)
    }

    /// Remove the file; a missing file is not an error.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Read `(download, upload)` back. `Ok(None)` when no sample is published.
    pub fn read(path: &Path) -> io::Result<Option<(f64, f64)>> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut fields = content.split_whitespace().map(str::parse::<f64>);
        match (fields.next(), fields.next()) {
            (Some(Ok(down)), Some(Ok(up))) => Ok(Some((down, up))),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed rate file {}", path.display()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_clear() {
        let dir = mktemp::Temp::new_dir().unwrap();
        let file = RateFile::new(dir.to_path_buf().join("rate"));

        assert_eq!(RateFile::read(file.path()).unwrap(), None);

        file.write(&RateSample {
            download_mbps: 1.6,
            upload_mbps: 0.0,
            window_seconds: 5.0,
        })
        .unwrap();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "1.60 0.00\n");
        assert_eq!(RateFile::read(file.path()).unwrap(), Some((1.6, 0.0)));

        file.clear().unwrap();
        file.clear().unwrap();
        assert!(!file.path().exists());
    }

    #[test]
    fn malformed_file_is_invalid_data() {
        let dir = mktemp::Temp::new_dir().unwrap();
        let path = dir.to_path_buf().join("rate");
        fs::write(&path, "fast\n").unwrap();

        let err = RateFile::read(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}

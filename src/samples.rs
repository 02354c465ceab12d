//! Append-only store of probe outcomes, the training data for an oracle.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::oracle::{Features, WINDOW_LEN};
use crate::types::Coord;

pub const CSV_HEADER: [&str; WINDOW_LEN + 2] = [
    "top_left",
    "top",
    "top_right",
    "left",
    "center",
    "right",
    "bottom_left",
    "bottom",
    "bottom_right",
    "probability",
    "has_mine",
];

/// One resolved probabilistic probe.
///
/// The CSV row carries only the window, probability and outcome; `at` is
/// kept for in-memory sinks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub at: Coord,
    pub window: [i8; WINDOW_LEN],
    pub probability: f64,
    pub mine: bool,
}

impl Sample {
    pub fn new(at: Coord, features: Features, mine: bool) -> Self {
        Self {
            at,
            window: features.window,
            probability: features.probability,
            mine,
        }
    }

    fn record(&self) -> Vec<String> {
        let mut row: Vec<String> = self.window.iter().map(|v| v.to_string()).collect();
        row.push(self.probability.to_string());
        row.push(u8::from(self.mine).to_string());
        row
    }
}

pub trait SampleSink {
    fn append(&mut self, sample: &Sample) -> Result<()>;
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SampleSink for NullSink {
    fn append(&mut self, _sample: &Sample) -> Result<()> {
        Ok(())
    }
}

impl SampleSink for Vec<Sample> {
    fn append(&mut self, sample: &Sample) -> Result<()> {
        self.push(*sample);
        Ok(())
    }
}

/// CSV file opened in append mode. The header is written once, when the
/// file is new or empty.
pub struct CsvSampleStore {
    path: PathBuf,
    writer: csv::Writer<std::fs::File>,
    written: usize,
}

impl CsvSampleStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| Error::Io {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        let empty = file.metadata().map_err(io_err)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if empty {
            writer.write_record(CSV_HEADER)?;
            writer.flush().map_err(io_err)?;
        }

        tracing::debug!(path = %path.display(), new = empty, "sample store opened");
        Ok(Self {
            path,
            writer,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended through this handle.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl SampleSink for CsvSampleStore {
    fn append(&mut self, sample: &Sample) -> Result<()> {
        self.writer.write_record(sample.record())?;
        self.writer.flush().map_err(|source| Error::Io {
            path: self.path.clone(),
            source,
        })?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(mine: bool) -> Sample {
        Sample {
            at: Coord::new(0, 1),
            window: [-1, -1, -1, 1, 10, 2, 9, 10, 10],
            probability: 0.25,
            mine,
        }
    }

    #[test]
    fn test_csv_store_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");

        {
            let mut store = CsvSampleStore::open(&path).unwrap();
            store.append(&sample(true)).unwrap();
            assert_eq!(store.written(), 1);
        }
        {
            let mut store = CsvSampleStore::open(&path).unwrap();
            store.append(&sample(false)).unwrap();
        }

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert_eq!(lines[1], "-1,-1,-1,1,10,2,9,10,10,0.25,1");
        assert_eq!(lines[2], "-1,-1,-1,1,10,2,9,10,10,0.25,0");
    }

    #[test]
    fn test_csv_store_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("samples.csv");
        let err = CsvSampleStore::open(&path).err().unwrap();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_memory_sinks() {
        let mut kept: Vec<Sample> = Vec::new();
        SampleSink::append(&mut kept, &sample(true)).unwrap();
        assert_eq!(kept, vec![sample(true)]);
        NullSink.append(&sample(false)).unwrap();
    }
}

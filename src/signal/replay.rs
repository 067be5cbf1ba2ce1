//! Replay buffer of pre-recorded waveform excerpts.
//!
//! Loaded once at startup and immutable afterwards; indices wrap modulo
//! the record count, so any tick counter maps to a valid record.

use std::fmt;
use std::fs;
use std::path::Path;

use super::Waveform;

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// The source held no records at all.
    Empty,
    /// A record had fewer samples than one waveform window needs.
    ShortRecord {
        index: usize,
        len: usize,
        expected: usize,
    },
    /// The source directory or a record file could not be read.
    Io { path: String, message: String },
    /// A record file was not a usable mono WAV.
    Format { path: String, message: String },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Empty => write!(f, "replay dataset is empty"),
            DatasetError::ShortRecord {
                index,
                len,
                expected,
            } => write!(
                f,
                "replay record {index} has {len} samples, need at least {expected}"
            ),
            DatasetError::Io { path, message } => write!(f, "failed to read {path}: {message}"),
            DatasetError::Format { path, message } => write!(f, "bad record {path}: {message}"),
        }
    }
}

impl std::error::Error for DatasetError {}

/// Ordered, read-only collection of fixed-length waveforms.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    records: Vec<Waveform>,
}

impl ReplayBuffer {
    /// Build from in-memory rows. Rows longer than `length` are truncated
    /// to the first `length` samples; shorter rows are fatal.
    pub fn from_rows(rows: Vec<Vec<f32>>, length: usize) -> Result<Self, DatasetError> {
        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }
        let mut records = Vec::with_capacity(rows.len());
        for (index, mut row) in rows.into_iter().enumerate() {
            if row.len() < length {
                return Err(DatasetError::ShortRecord {
                    index,
                    len: row.len(),
                    expected: length,
                });
            }
            row.truncate(length);
            records.push(Waveform::from_samples(row));
        }
        Ok(Self { records })
    }

    /// Load one record per mono WAV file in `dir`, in file-name order.
    pub fn load_wav_dir(dir: &Path, length: usize) -> Result<Self, DatasetError> {
        let entries = fs::read_dir(dir).map_err(|err| DatasetError::Io {
            path: dir.display().to_string(),
            message: err.to_string(),
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "wav"))
            .collect();
        paths.sort();

        let mut rows = Vec::with_capacity(paths.len());
        for path in &paths {
            rows.push(read_mono_wav(path)?);
        }
        Self::from_rows(rows, length)
    }

    /// Record at `index mod B`.
    pub fn get(&self, index: usize) -> &Waveform {
        &self.records[index % self.records.len()]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_mono_wav(path: &Path) -> Result<Vec<f32>, DatasetError> {
    let format_err = |message: String| DatasetError::Format {
        path: path.display().to_string(),
        message,
    };

    let mut reader = hound::WavReader::open(path).map_err(|err| format_err(err.to_string()))?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(format_err(format!(
            "expected mono, got {} channels",
            spec.channels
        )));
    }

    match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| format_err(err.to_string())),
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| format_err(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_truncated_to_window_length() {
        let buffer = ReplayBuffer::from_rows(
            vec![vec![0.1; 10], vec![0.2; 8], vec![0.3; 9]],
            8,
        )
        .expect("load");
        assert_eq!(buffer.len(), 3);
        for i in 0..3 {
            assert_eq!(buffer.get(i).len(), 8);
        }
    }

    #[test]
    fn short_record_is_fatal() {
        let err = ReplayBuffer::from_rows(vec![vec![0.0; 8], vec![0.0; 5]], 8).unwrap_err();
        assert_eq!(
            err,
            DatasetError::ShortRecord {
                index: 1,
                len: 5,
                expected: 8
            }
        );
    }

    #[test]
    fn empty_dataset_is_fatal() {
        let err = ReplayBuffer::from_rows(Vec::new(), 8).unwrap_err();
        assert_eq!(err, DatasetError::Empty);
    }

    #[test]
    fn indices_wrap_modulo_record_count() {
        let rows = vec![vec![1.0; 4], vec![2.0; 4], vec![3.0; 4]];
        let buffer = ReplayBuffer::from_rows(rows, 4).expect("load");
        assert_eq!(buffer.get(0), buffer.get(3));
        assert_eq!(buffer.get(2), buffer.get(5));
        assert_eq!(buffer.get(7).samples()[0], 2.0);
    }
}

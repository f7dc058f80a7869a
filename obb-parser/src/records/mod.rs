use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::Path,
};

use thiserror::Error;

use obb_core::{
    error::MalformedRecordError,
    record::{parse_record_line, CanonicalRecord},
};

#[derive(Debug, Error)]
pub enum RecordFileError {
    #[error("failed to read records: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: MalformedRecordError,
    },
}

/// What to do with a record line that does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordPolicy {
    /// Stop at the first malformed line.
    FailFast,
    /// Skip the line, log a warning and remember it in [`RecordSet::skipped`].
    #[default]
    SkipAndWarn,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub records: Vec<CanonicalRecord>,
    /// 1-based line numbers of skipped lines with the reason.
    pub skipped: Vec<(usize, MalformedRecordError)>,
}

/// Parses record lines from `reader`. Blank lines are ignored.
pub fn parse_records<R: BufRead>(
    reader: R,
    policy: RecordPolicy,
) -> Result<RecordSet, RecordFileError> {
    let mut set = RecordSet::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_record_line(&line) {
            Ok(record) => set.records.push(record),
            Err(source) => match policy {
                RecordPolicy::FailFast => {
                    return Err(RecordFileError::Malformed {
                        line: index + 1,
                        source,
                    })
                }
                RecordPolicy::SkipAndWarn => set.skipped.push((index + 1, source)),
            },
        }
    }

    Ok(set)
}

pub fn read_records(path: &Path, policy: RecordPolicy) -> Result<RecordSet, RecordFileError> {
    let file = File::open(path)?;
    let set = parse_records(BufReader::new(file), policy)?;
    for (line, error) in &set.skipped {
        log::warn!("{}:{}: skipping record: {}", path.display(), line, error);
    }
    Ok(set)
}

/// Writes one newline-terminated line per record.
pub fn write_records<W: Write>(mut writer: W, records: &[CanonicalRecord]) -> io::Result<()> {
    for record in records {
        writeln!(writer, "{}", record)?;
    }
    writer.flush()
}

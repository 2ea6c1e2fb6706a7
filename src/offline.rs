use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::RecapError;
use crate::models::{AttendanceRecord, Student};

pub fn load_students(path: &Path) -> Result<Vec<Student>, RecapError> {
    load(path)
}

pub fn load_attendance(path: &Path) -> Result<Vec<AttendanceRecord>, RecapError> {
    load(path)
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, RecapError> {
    let wrap = |source| RecapError::Source {
        path: path.display().to_string(),
        source,
    };
    let reader = csv::Reader::from_path(path).map_err(wrap)?;
    let rows = read_rows(reader).map_err(wrap)?;
    tracing::debug!(rows = rows.len(), path = %path.display(), "loaded csv");
    Ok(rows)
}

fn read_rows<T: DeserializeOwned, R: io::Read>(mut reader: csv::Reader<R>) -> csv::Result<Vec<T>> {
    reader.deserialize().collect()
}

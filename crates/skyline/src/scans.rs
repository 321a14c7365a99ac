//! Persistence of flight ticket scan results.
//!
//! Scan results are written as pretty-printed JSON files named after the
//! local wall-clock time of the save. Entries are opaque to the service and
//! are stored exactly as the client sent them. A name that is already taken gets a
//! numeric suffix, so saves within the same second never overwrite each other.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// File name prefix for persisted scans.
pub const FILE_PREFIX: &str = "flugtickets-";

/// Upper bound on collision suffixes tried before giving up.
const MAX_SUFFIX: u32 = 10_000;

/// The document written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanContainer {
    /// All entries collected in one scanning session, in client order.
    #[serde(rename = "flightTicketScan")]
    pub flight_ticket_scan: Vec<Value>,
}

/// Accepted request bodies for a save.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SavePayload {
    /// A bare list of entries.
    Bare(Vec<Value>),
    /// Entries already wrapped in a container.
    Wrapped(ScanContainer),
}

impl SavePayload {
    /// Validate an arbitrary JSON body into a container.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` unless the body is an array or an object with a
    /// `flightTicketScan` array.
    pub fn from_value(value: Value) -> Result<ScanContainer> {
        serde_json::from_value::<Self>(value)
            .map(Into::into)
            .map_err(|_| Error::bad_request("Body must be an array or { flightTicketScan: [...] }"))
    }
}

impl From<SavePayload> for ScanContainer {
    fn from(payload: SavePayload) -> Self {
        match payload {
            SavePayload::Bare(flight_ticket_scan) => Self { flight_ticket_scan },
            SavePayload::Wrapped(container) => container,
        }
    }
}

/// File stem for a save at the given local time, e.g.
/// `flugtickets-2024-01-05_09-03-07`.
#[must_use]
pub fn scan_file_stem(at: NaiveDateTime) -> String {
    format!("{FILE_PREFIX}{}", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Writes scan containers into one directory.
#[derive(Debug, Clone)]
pub struct ScanWriter {
    dir: PathBuf,
}

impl ScanWriter {
    /// Create a writer for the given output directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The configured output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save using the current local time.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the directory or file cannot be written.
    pub fn save(&self, container: &ScanContainer) -> Result<PathBuf> {
        self.save_at(container, Local::now().naive_local())
    }

    /// Save as if the current local time were `at`.
    ///
    /// Returns the absolute path of the new file.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the directory or file cannot be written.
    pub fn save_at(&self, container: &ScanContainer, at: NaiveDateTime) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::internal(format!("{}: {e}", self.dir.display())))?;
        let dir = self
            .dir
            .canonicalize()
            .map_err(|e| Error::internal(format!("{}: {e}", self.dir.display())))?;

        let json = serde_json::to_string_pretty(container)
            .map_err(|e| Error::internal(e.to_string()))?;

        let stem = scan_file_stem(at);
        for suffix in 0..MAX_SUFFIX {
            let name = if suffix == 0 {
                format!("{stem}.json")
            } else {
                format!("{stem}-{suffix}.json")
            };
            let path = dir.join(name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} exists, trying next suffix", path.display());
                    continue;
                }
                Err(e) => return Err(Error::internal(format!("{}: {e}", path.display()))),
            };

            file.write_all(json.as_bytes())
                .map_err(|e| Error::internal(format!("{}: {e}", path.display())))?;

            info!(
                count = container.flight_ticket_scan.len(),
                "Saved scan results to {}",
                path.display()
            );
            return Ok(path);
        }

        Err(Error::internal(format!(
            "no free file name for {stem} in {}",
            dir.display()
        )))
    }
}

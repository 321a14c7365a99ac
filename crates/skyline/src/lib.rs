//! `skyline` - Backend for the Skyline travel companion app
//!
//! This library provides barcode recognition for boarding pass images,
//! parsing of IATA boarding pass barcodes, persistence of scan results,
//! flight-time lookups against `AeroDataBox` and a small key-value store for
//! favorite flights.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod barcode;
pub mod bcbp;
pub mod cli;
pub mod config;
pub mod error;
pub mod favorites;
pub mod flight;
pub mod logging;
pub mod scans;
pub mod server;
pub mod storage;

pub use barcode::{BarcodeResult, RawImage};
pub use bcbp::BoardingPass;
pub use config::Config;
pub use error::{Error, Result};
pub use favorites::Favorites;
pub use flight::{FlightLookup, FlightTimes};
pub use logging::init_logging;
pub use scans::{ScanContainer, ScanWriter};
pub use storage::{Storage, StorageStats};

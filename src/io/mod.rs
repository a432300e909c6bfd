//! I/O module
//!
//! Handles scenario CSV parsing and card output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (command conversion, card serialization)
//! - `async_reader` - Asynchronous scenario reader with batch reading interface

pub mod async_reader;
pub mod csv_format;

pub use async_reader::{AsyncReader, ScenarioStep};
pub use csv_format::{CommandRecord, SessionCommand, convert_command_record, write_cards_csv};

//! Reader and writer for the Dynacolor DVR container (`.dyna`, `.dyn`).
//!
//! A recording is a flat sequence of records, each carrying one frame of a
//! single elementary stream:
//!
//! ```text
//! [16-byte basic header] [extra + super-extra headers] [32-byte PES header] [payload]
//! ```
//!
//! [`record::read_frame_header`] and [`record::encode_frame_header`] are the
//! per-record codec; [`reader::DynaReader`] and [`writer::DynaWriter`] drive
//! them over a whole file.

pub mod bits;
pub mod codec;
pub mod error;
pub mod format;
pub mod header;
pub mod pes;
pub mod reader;
pub mod record;
pub mod size;
pub mod writer;

pub use error::{DynaError, Result};
pub use format::StreamFormat;
pub use reader::{open_dyna, parse_dyna, probe, DynaReader, ReaderOptions};
pub use writer::DynaWriter;

//! Reader and writer for EnSim r2c grid datasets.
//!
//! An r2c file is a text header of `:Keyword value` lines followed by
//! either one block of values per attribute (single-frame) or a sequence of
//! `:Frame` / `:EndFrame` wrapped blocks for a single attribute
//! (multi-frame).
//!
//! ```ignore
//! use r2c_parser::{read_r2c_file, WriterInfo};
//!
//! let dataset = read_r2c_file("MESH_drainage_database.r2c")?;
//! let rank = dataset.require("Rank")?;
//! dataset.write_file("copy.r2c", &WriterInfo::default())?;
//! ```

pub mod attribute;
pub mod body;
pub mod dataset;
pub mod header;
pub mod writer;

pub use attribute::{AttributeSpec, AttributeType};
pub use body::{detect_frame_mode, read_multi_frame, read_single_frame, Frame, FrameMode, FrameReader};
pub use dataset::{open_r2c_file, read_r2c, read_r2c_file, read_r2c_str, Payload, R2cDataset, R2cReader};
pub use header::{parse_header, parse_header_str, write_header, Banner, HeaderBlock, WriterInfo};
pub use writer::R2cWriter;

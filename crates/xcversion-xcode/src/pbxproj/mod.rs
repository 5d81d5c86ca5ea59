//! `project.pbxproj` reading and editing

mod document;
mod lexer;
mod parser;

pub use document::{line_column, PbxprojDocument};
pub use parser::{Dict, Entry, Scalar, Value};

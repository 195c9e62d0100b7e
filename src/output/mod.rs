//! Output formatters for scan summaries.
//!
//! This module provides the two summary formats printed at the end of a run:
//! - Text for people reading a terminal
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use hashledger::duplicates::DuplicateFinder;
//! use hashledger::error::ExitCode;
//! use hashledger::output::json::JsonOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::default();
//! let summary = finder.run(Path::new("."), Path::new("image.db")).unwrap();
//!
//! let output = JsonOutput::new(&summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

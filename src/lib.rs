//! ddfscan - Executable MDM command extraction from Windows CSP DDF schemas
//!
//! This library turns a directory of Microsoft DDF (Device Description
//! Framework) XML files into a structured catalog of the MDM commands a
//! device can execute.
//!
//! # Architecture
//!
//! The extraction pipeline consists of:
//! 1. **File Discovery** - Find all .xml files in the input directory
//! 2. **Parsing** - Build an arena tree of DDF nodes per document
//! 3. **Collection** - Select Exec-capable nodes and rebuild their OMA-URIs
//! 4. **Deduplication** - Collapse repeated (URI, source file) pairs
//! 5. **Reporting** - Emit the catalog as JSON or a terminal listing

pub mod config;
pub mod discovery;
pub mod extract;
pub mod parser;
pub mod report;
pub mod syncml;

pub use config::Config;
pub use discovery::{DdfFile, FileFinder};
pub use extract::{dedupe, CommandCollector, CommandRecord};
pub use parser::{AccessType, DdfError, DdfNode, DdfParser, DdfTree};
pub use report::{Reporter, ReportFormat};

//! User-facing output for batch runs.
//!
//! Every worker reports through one shared [`Reporter`]:
//! - `[ OK ] <name>` / `[FAIL] <name> - <message>` per input
//! - removal and keep records (console only with `--verbose`)
//! - the final `SUCCESS/FAIL/COST` summary
//!
//! # Example
//!
//! ```
//! use itemdedup::output::{Reporter, ReporterConfig, SharedBuffer};
//!
//! let out = SharedBuffer::new();
//! let reporter = Reporter::with_writers(
//!     ReporterConfig::default(),
//!     Box::new(out.clone()),
//!     Box::new(std::io::sink()),
//! );
//! reporter.success("StringResource.xml");
//! assert_eq!(reporter.counts(), (1, 0));
//! assert_eq!(out.contents(), "[ OK ] StringResource.xml\n");
//! ```

pub mod reporter;

pub use reporter::{format_summary, group_thousands, Reporter, ReporterConfig, SharedBuffer};

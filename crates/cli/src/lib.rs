#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `msync_cli` is the command-line front-end of the `msync` mirror
//! synchroniser. It parses `msync [OPTIONS] SOURCE... DEST`, configures
//! diagnostics through `msync_logging`, and delegates the run itself to
//! [`msync_core::Coordinator`].
//!
//! # Design
//!
//! [`run`] accepts the argument vector together with handles for standard
//! output and error so the whole front-end can be driven in-process by
//! tests. The binary wraps it and converts the returned status with
//! [`exit_code_from`].
//!
//! # Invariants
//!
//! - `run` never panics; I/O failures surface as non-zero exit codes.
//! - Partial transfers (rsync codes 23 and 24) and runs skipped because
//!   another instance holds the lock exit with status 0.
//! - Every other failure prints one `msync error: ... (code N)` line.
//!
//! # Examples
//!
//! ```
//! use msync_cli::run;
//!
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = run(["msync", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("msync "));
//! assert!(stderr.is_empty());
//! ```

mod frontend;

pub use frontend::{exit_code_from, run};

/// Argument parsing internals exposed for integration tests.
pub mod test_utils {
    pub use crate::frontend::arguments::{ParsedArgs, parse_args};
}

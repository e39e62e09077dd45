//! Upstream selection.
//!
//! Candidates are probed strictly in the order given; the first reachable
//! one wins and nothing after it is contacted.

use std::ffi::OsString;

use tracing::{info, warn};

use crate::trace_probe;
use crate::transfer::{CaptureOutput, TransferInvoker, TransferTimeouts};

/// Chooses an upstream among ordered candidates.
#[derive(Clone, Debug)]
pub struct UpstreamProber {
    invoker: TransferInvoker,
    skip: bool,
}

impl UpstreamProber {
    /// Creates a prober that runs `binary` with probe timeouts.
    pub fn new(binary: impl Into<OsString>) -> Self {
        Self {
            invoker: TransferInvoker::new(binary).with_timeouts(TransferTimeouts::PROBE),
            skip: false,
        }
    }

    /// Uses the first candidate without contacting it.
    #[must_use]
    pub const fn skip_probe(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// Returns the first candidate that answers a probe.
    pub fn select<S: AsRef<str>>(
        &self,
        candidates: &[S],
        extra_options: &[OsString],
    ) -> Option<String> {
        if self.skip {
            let first = candidates.first().map(|candidate| candidate.as_ref().to_owned());
            if let Some(first) = &first {
                info!(target: "msync::probe", upstream = %first, "probe skipped, using first source");
            }
            return first;
        }

        for candidate in candidates {
            let candidate = candidate.as_ref();
            if self.probe(candidate, extra_options) {
                info!(target: "msync::probe", upstream = %candidate, "selected upstream");
                return Some(candidate.to_owned());
            }
        }

        None
    }

    fn probe(&self, candidate: &str, extra_options: &[OsString]) -> bool {
        trace_probe!(upstream = %candidate, "probing");
        let mut output = CaptureOutput::new();
        match self.invoker.invoke(candidate, None, extra_options, &mut output) {
            Ok(outcome) if !outcome.is_failure() => true,
            Ok(outcome) => {
                warn!(
                    target: "msync::probe",
                    upstream = %candidate,
                    code = outcome.raw_code(),
                    "upstream unreachable"
                );
                trace_probe!(output = %outcome.output_text().trim_end());
                false
            }
            Err(error) => {
                warn!(target: "msync::probe", upstream = %candidate, %error, "probe failed");
                false
            }
        }
    }
}

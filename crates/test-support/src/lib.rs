//! Test doubles shared across the msync workspace.
//!
//! [`FakeRsync`] writes a POSIX shell script that stands in for the rsync
//! engine. Each invocation appends its argument list to a log file and exits
//! with a scripted status. An invocation counts as a transfer when it carries
//! `--recursive`, otherwise it is a probe. The source operand is the last
//! argument of a probe and the second to last of a transfer.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Builder for a scripted stand-in rsync binary.
#[derive(Clone, Debug)]
pub struct FakeRsync {
    dir: PathBuf,
    probe_exit: i32,
    transfer_exit: i32,
    overrides: Vec<(Mode, String, i32)>,
    output: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    Probe,
    Transfer,
}

impl Mode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Transfer => "transfer",
        }
    }
}

impl FakeRsync {
    /// Places the script and its log under `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            probe_exit: 0,
            transfer_exit: 0,
            overrides: Vec::new(),
            output: None,
        }
    }

    /// Default status for probes.
    pub fn probe_exit(mut self, code: i32) -> Self {
        self.probe_exit = code;
        self
    }

    /// Default status for transfers.
    pub fn transfer_exit(mut self, code: i32) -> Self {
        self.transfer_exit = code;
        self
    }

    /// Status for probes of `source`.
    pub fn probe_exit_for(mut self, source: &str, code: i32) -> Self {
        self.overrides.push((Mode::Probe, source.to_owned(), code));
        self
    }

    /// Status for transfers from `source`.
    pub fn transfer_exit_for(mut self, source: &str, code: i32) -> Self {
        self.overrides.push((Mode::Transfer, source.to_owned(), code));
        self
    }

    /// Line printed to stderr by every invocation.
    pub fn output(mut self, text: &str) -> Self {
        self.output = Some(text.to_owned());
        self
    }

    /// Writes the executable script.
    #[cfg(unix)]
    pub fn install(self) -> io::Result<InstalledFake> {
        use std::os::unix::fs::PermissionsExt;

        fs::create_dir_all(&self.dir)?;
        let binary = self.dir.join("fake-rsync");
        let log = self.dir.join("fake-rsync.log");

        fs::write(&binary, self.script(&log))?;
        let mut permissions = fs::metadata(&binary)?.permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&binary, permissions)?;

        Ok(InstalledFake { binary, log })
    }

    fn script(&self, log: &Path) -> String {
        let mut script = String::from("#!/bin/sh\n");
        let _ = writeln!(script, "printf '%s\\n' \"$*\" >> {}", quote(&log.to_string_lossy()));
        script.push_str(
            "mode=probe\n\
             case \" $* \" in *\" --recursive \"*) mode=transfer ;; esac\n\
             prev=\n\
             last=\n\
             for arg in \"$@\"; do prev=$last; last=$arg; done\n\
             if [ \"$mode\" = probe ]; then source=$last; else source=$prev; fi\n",
        );
        if let Some(output) = &self.output {
            let _ = writeln!(script, "printf '%s\\n' {} >&2", quote(output));
        }
        script.push_str("case \"$mode:$source\" in\n");
        for (mode, source, code) in &self.overrides {
            let _ = writeln!(
                script,
                "  {}) exit {code} ;;",
                quote(&format!("{}:{source}", mode.as_str()))
            );
        }
        script.push_str("esac\n");
        let _ = writeln!(
            script,
            "if [ \"$mode\" = probe ]; then exit {}; fi\nexit {}",
            self.probe_exit, self.transfer_exit
        );
        script
    }
}

/// A script written to disk by [`FakeRsync::install`].
#[derive(Clone, Debug)]
pub struct InstalledFake {
    binary: PathBuf,
    log: PathBuf,
}

impl InstalledFake {
    /// Path to pass as the rsync binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// One line per invocation, arguments joined by spaces.
    pub fn invocations(&self) -> io::Result<Vec<String>> {
        match fs::read_to_string(&self.log) {
            Ok(content) => Ok(content.lines().map(str::to_owned).collect()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error),
        }
    }

    /// Invocations that were real transfers.
    pub fn transfers(&self) -> io::Result<Vec<String>> {
        Ok(self
            .invocations()?
            .into_iter()
            .filter(|line| line.split(' ').any(|arg| arg == "--recursive"))
            .collect())
    }

    /// Invocations that were probes.
    pub fn probes(&self) -> io::Result<Vec<String>> {
        Ok(self
            .invocations()?
            .into_iter()
            .filter(|line| !line.split(' ').any(|arg| arg == "--recursive"))
            .collect())
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

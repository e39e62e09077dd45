//! Verbosity configuration mapping command-line flags to per-component levels.

use tracing::Level;
use tracing::level_filters::LevelFilter;

/// Subsystems that emit diagnostics under an `msync::<name>` target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Component {
    /// Instance lock acquisition and release.
    Lock,
    /// Upstream probing.
    Probe,
    /// Marker comparison.
    Marker,
    /// Engine invocation.
    Transfer,
    /// Randomized start delay.
    Delay,
    /// End-of-run cleanup.
    Cleanup,
}

impl Component {
    /// Every component, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Lock,
        Self::Probe,
        Self::Marker,
        Self::Transfer,
        Self::Delay,
        Self::Cleanup,
    ];

    /// Tracing target used by this component.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Lock => "msync::lock",
            Self::Probe => "msync::probe",
            Self::Marker => "msync::marker",
            Self::Transfer => "msync::transfer",
            Self::Delay => "msync::delay",
            Self::Cleanup => "msync::cleanup",
        }
    }

    /// Maps a tracing target onto a component.
    ///
    /// Targets nested below a component (`msync::probe::http`) belong to it.
    #[must_use]
    pub fn from_target(target: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|component| {
            let prefix = component.target();
            target == prefix
                || target
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Per-component level thresholds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerbosityConfig {
    components: [LevelFilter; Component::ALL.len()],
    other: LevelFilter,
}

impl VerbosityConfig {
    /// Only errors.
    #[must_use]
    pub fn quiet() -> Self {
        Self::uniform(LevelFilter::ERROR, LevelFilter::ERROR)
    }

    /// Maps a `-v` count onto levels.
    ///
    /// | count | msync components | other crates |
    /// |-------|------------------|--------------|
    /// | 0     | warn             | error        |
    /// | 1     | info             | error        |
    /// | 2     | debug            | warn         |
    /// | 3+    | trace            | debug        |
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        match level {
            0 => Self::uniform(LevelFilter::WARN, LevelFilter::ERROR),
            1 => Self::uniform(LevelFilter::INFO, LevelFilter::ERROR),
            2 => Self::uniform(LevelFilter::DEBUG, LevelFilter::WARN),
            _ => Self::uniform(LevelFilter::TRACE, LevelFilter::DEBUG),
        }
    }

    /// Combines `--quiet` and the `-v` count. Quiet wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            Self::quiet()
        } else {
            Self::from_verbose_level(verbose)
        }
    }

    const fn uniform(components: LevelFilter, other: LevelFilter) -> Self {
        Self {
            components: [components; Component::ALL.len()],
            other,
        }
    }

    /// Threshold for `component`.
    #[must_use]
    pub const fn level(&self, component: Component) -> LevelFilter {
        self.components[component.index()]
    }

    /// Threshold applied to an arbitrary target.
    #[must_use]
    pub fn level_for_target(&self, target: &str) -> LevelFilter {
        match Component::from_target(target) {
            Some(component) => self.level(component),
            None if target == "msync" || target.starts_with("msync::") => self.most_verbose(),
            None => self.other,
        }
    }

    /// Whether an event at `level` for `target` passes.
    #[must_use]
    pub fn enabled(&self, target: &str, level: Level) -> bool {
        level <= self.level_for_target(target)
    }

    fn most_verbose(&self) -> LevelFilter {
        self.components
            .iter()
            .copied()
            .max()
            .unwrap_or(LevelFilter::WARN)
    }
}

impl Default for VerbosityConfig {
    fn default() -> Self {
        Self::from_verbose_level(0)
    }
}

//! Planner configuration.

/// Header the instrumented source includes.
pub const DEFAULT_RUNTIME_HEADER: &str = "runtime_library.h";

/// Function treated as the program entry point.
pub const DEFAULT_ENTRY_POINT: &str = "main";

/// What to do with the closing-brace exit call when a body already ends in
/// a `return`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrailingExit {
    /// Keep both the return-site exit and the closing-brace exit.
    /// The closing one is unreachable but textually present.
    #[default]
    Duplicate,
    /// Drop the closing-brace exit so each path has exactly one.
    Elide,
}

/// Where the entry point's finalize call goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntryFinalize {
    /// Before the body's last statement if it is a `return`, otherwise before
    /// the closing brace. Earlier returns skip finalization.
    #[default]
    BeforeTrailingStatement,
    /// Before every `return` in the entry point, and before the closing brace
    /// when control can fall off the end.
    EveryReturn,
}

/// Names of the runtime entry points the generated calls target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeNames {
    pub init: String,
    pub entry: String,
    pub exit: String,
    pub finalize: String,
}

impl Default for ProbeNames {
    fn default() -> Self {
        Self {
            init: "runtime_library_init".to_string(),
            entry: "runtime_function_entry".to_string(),
            exit: "runtime_function_exit".to_string(),
            finalize: "runtime_library_finalize".to_string(),
        }
    }
}

/// Patch planning configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanConfig {
    /// Header named by the `#include` prepended to every output.
    pub runtime_header: String,
    /// Name of the function that gets init/finalize instead of entry/exit.
    pub entry_point: String,
    pub probes: ProbeNames,
    pub trailing_exit: TrailingExit,
    pub entry_finalize: EntryFinalize,
    /// Wrap an unbraced `return` arm and its exit call in braces.
    pub brace_unbraced_returns: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            runtime_header: DEFAULT_RUNTIME_HEADER.to_string(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            probes: ProbeNames::default(),
            trailing_exit: TrailingExit::default(),
            entry_finalize: EntryFinalize::default(),
            brace_unbraced_returns: true,
        }
    }
}

impl PlanConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_runtime_header(mut self, header: impl Into<String>) -> Self {
        self.runtime_header = header.into();
        self
    }

    #[must_use]
    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }

    #[must_use]
    pub fn with_probes(mut self, probes: ProbeNames) -> Self {
        self.probes = probes;
        self
    }

    #[must_use]
    pub const fn with_trailing_exit(mut self, policy: TrailingExit) -> Self {
        self.trailing_exit = policy;
        self
    }

    #[must_use]
    pub const fn with_entry_finalize(mut self, policy: EntryFinalize) -> Self {
        self.entry_finalize = policy;
        self
    }

    #[must_use]
    pub const fn with_brace_unbraced_returns(mut self, enabled: bool) -> Self {
        self.brace_unbraced_returns = enabled;
        self
    }
}

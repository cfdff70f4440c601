//! Counter names accepted on the command line.

use std::fmt;

/// A countable event, independent of the backend that measures it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CounterId {
    Cycles,
    Instructions,
    Branches,
    BranchMisses,
    CacheReferences,
    CacheMisses,
    RefCycles,
    StalledFrontend,
    StalledBackend,
    TaskClock,
    CpuClock,
    PageFaults,
    ContextSwitches,
    CpuMigrations,
}

impl CounterId {
    /// True for events counted by the PMU rather than the kernel.
    #[must_use]
    pub const fn is_hardware(self) -> bool {
        !matches!(
            self,
            Self::TaskClock
                | Self::CpuClock
                | Self::PageFaults
                | Self::ContextSwitches
                | Self::CpuMigrations
        )
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = COUNTER_NAMES
            .iter()
            .rev()
            .find(|(_, id)| id == self)
            .map_or("?", |(name, _)| name);
        f.write_str(name)
    }
}

/// Every accepted spelling. PAPI preset names first, then perf-style names.
pub const COUNTER_NAMES: &[(&str, CounterId)] = &[
    ("PAPI_TOT_CYC", CounterId::Cycles),
    ("PAPI_TOT_INS", CounterId::Instructions),
    ("PAPI_BR_INS", CounterId::Branches),
    ("PAPI_BR_MSP", CounterId::BranchMisses),
    ("PAPI_L3_TCA", CounterId::CacheReferences),
    ("PAPI_L3_TCM", CounterId::CacheMisses),
    ("PAPI_REF_CYC", CounterId::RefCycles),
    ("PAPI_STL_ICY", CounterId::StalledFrontend),
    ("PAPI_RES_STL", CounterId::StalledBackend),
    ("cpu-cycles", CounterId::Cycles),
    ("cycles", CounterId::Cycles),
    ("instructions", CounterId::Instructions),
    ("branch-instructions", CounterId::Branches),
    ("branches", CounterId::Branches),
    ("branch-misses", CounterId::BranchMisses),
    ("cache-references", CounterId::CacheReferences),
    ("cache-misses", CounterId::CacheMisses),
    ("ref-cycles", CounterId::RefCycles),
    ("stalled-cycles-frontend", CounterId::StalledFrontend),
    ("stalled-cycles-backend", CounterId::StalledBackend),
    ("task-clock", CounterId::TaskClock),
    ("cpu-clock", CounterId::CpuClock),
    ("page-faults", CounterId::PageFaults),
    ("context-switches", CounterId::ContextSwitches),
    ("cpu-migrations", CounterId::CpuMigrations),
];

/// Look up a counter by name. Names are case-sensitive.
#[must_use]
pub fn counter_id(name: &str) -> Option<CounterId> {
    COUNTER_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, id)| id)
}

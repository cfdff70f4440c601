//! Platform-specific performance counter backend.
//!
//! On Linux, uses the `perf_event` crate for hardware and software counters.
//! On other platforms no name resolves, so initialization fails fast.

use crate::backend::CounterBackend;
use crate::counters::{CounterId, counter_id};

// ============================================================================
// Linux implementation
// ============================================================================

#[cfg(target_os = "linux")]
mod inner {
    use std::io;

    use perf_event::events::{Event, Hardware, Software};
    use perf_event::{Builder, Counter, Group};

    use crate::counters::CounterId;

    /// Counter group for in-process measurement of the calling thread.
    pub struct PerfGroup {
        group: Group,
        members: Vec<Counter>,
    }

    impl PerfGroup {
        pub fn new() -> io::Result<Self> {
            Ok(Self {
                group: Group::new()?,
                members: Vec::new(),
            })
        }

        pub fn add(&mut self, id: CounterId) -> io::Result<()> {
            let counter = Builder::new()
                .group(&mut self.group)
                .kind(event(id))
                .build()?;
            self.members.push(counter);
            Ok(())
        }

        pub fn enable(&mut self) -> io::Result<()> {
            self.group.enable()
        }

        pub fn disable(&mut self) -> io::Result<()> {
            self.group.disable()
        }

        pub fn reset(&mut self) -> io::Result<()> {
            self.group.reset()
        }

        pub fn read(&mut self, values: &mut [i64]) -> io::Result<()> {
            let counts = self.group.read()?;
            for (slot, member) in values.iter_mut().zip(&self.members) {
                *slot = counts
                    .get(member)
                    .map_or(0, |&v| i64::try_from(v).unwrap_or(i64::MAX));
            }
            Ok(())
        }
    }

    fn event(id: CounterId) -> Event {
        match id {
            CounterId::Cycles => Hardware::CPU_CYCLES.into(),
            CounterId::Instructions => Hardware::INSTRUCTIONS.into(),
            CounterId::Branches => Hardware::BRANCH_INSTRUCTIONS.into(),
            CounterId::BranchMisses => Hardware::BRANCH_MISSES.into(),
            CounterId::CacheReferences => Hardware::CACHE_REFERENCES.into(),
            CounterId::CacheMisses => Hardware::CACHE_MISSES.into(),
            CounterId::RefCycles => Hardware::REF_CPU_CYCLES.into(),
            CounterId::StalledFrontend => Hardware::STALLED_CYCLES_FRONTEND.into(),
            CounterId::StalledBackend => Hardware::STALLED_CYCLES_BACKEND.into(),
            CounterId::TaskClock => Software::TASK_CLOCK.into(),
            CounterId::CpuClock => Software::CPU_CLOCK.into(),
            CounterId::PageFaults => Software::PAGE_FAULTS.into(),
            CounterId::ContextSwitches => Software::CONTEXT_SWITCHES.into(),
            CounterId::CpuMigrations => Software::CPU_MIGRATIONS.into(),
        }
    }

    pub const SUPPORTED: bool = true;
}

// ============================================================================
// Non-Linux stub implementation
// ============================================================================

#[cfg(not(target_os = "linux"))]
mod inner {
    use std::io;

    use crate::counters::CounterId;

    /// Stub counter group (never constructed successfully).
    pub struct PerfGroup;

    fn unsupported() -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "performance counters are only available on Linux",
        )
    }

    impl PerfGroup {
        pub fn new() -> io::Result<Self> {
            Err(unsupported())
        }

        pub fn add(&mut self, _id: CounterId) -> io::Result<()> {
            Err(unsupported())
        }

        pub fn enable(&mut self) -> io::Result<()> {
            Err(unsupported())
        }

        pub fn disable(&mut self) -> io::Result<()> {
            Err(unsupported())
        }

        pub fn reset(&mut self) -> io::Result<()> {
            Err(unsupported())
        }

        pub fn read(&mut self, _values: &mut [i64]) -> io::Result<()> {
            Err(unsupported())
        }
    }

    pub const SUPPORTED: bool = false;
}

pub use inner::PerfGroup;

/// Backend measuring the calling thread with perf events.
#[derive(Debug, Default)]
pub struct PerfBackend {
    groups: usize,
}

impl PerfBackend {
    #[must_use]
    pub const fn new() -> Self {
        Self { groups: 0 }
    }
}

impl CounterBackend for PerfBackend {
    type Code = CounterId;
    type Group = PerfGroup;

    fn resolve(&mut self, name: &str) -> Option<CounterId> {
        counter_id(name).filter(|_| inner::SUPPORTED)
    }

    fn create_group(&mut self) -> std::io::Result<PerfGroup> {
        let group = PerfGroup::new()?;
        self.groups += 1;
        Ok(group)
    }

    fn add(&mut self, group: &mut PerfGroup, code: CounterId) -> std::io::Result<()> {
        group.add(code)
    }

    fn start(&mut self, group: &mut PerfGroup) -> std::io::Result<()> {
        group.enable()
    }

    fn stop(&mut self, group: &mut PerfGroup, values: &mut [i64]) -> std::io::Result<()> {
        group.disable()?;
        group.read(values)
    }

    fn reset(&mut self, group: &mut PerfGroup) -> std::io::Result<()> {
        group.reset()
    }

    fn shutdown(&mut self) {
        tracing::debug!(groups = self.groups, "perf backend shut down");
        self.groups = 0;
    }
}

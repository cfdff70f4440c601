//! Counter backend interface.

use std::io;

/// Resolves counter names and drives one group of counters.
///
/// The recorder owns exactly one group for the whole run; every method is
/// called from a single thread.
pub trait CounterBackend {
    /// Backend-specific counter code.
    type Code: Copy;
    /// Handle to a group of counters started and stopped together.
    type Group;

    /// Map a counter name to a code, or `None` if it is unknown here.
    fn resolve(&mut self, name: &str) -> Option<Self::Code>;

    /// Create an empty group.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot allocate a group.
    fn create_group(&mut self) -> io::Result<Self::Group>;

    /// Add one counter to `group`.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be opened.
    fn add(&mut self, group: &mut Self::Group, code: Self::Code) -> io::Result<()>;

    /// Start counting.
    ///
    /// # Errors
    ///
    /// Returns an error if the group cannot be enabled.
    fn start(&mut self, group: &mut Self::Group) -> io::Result<()>;

    /// Stop counting and store one value per member, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the group cannot be disabled or read.
    fn stop(&mut self, group: &mut Self::Group, values: &mut [i64]) -> io::Result<()>;

    /// Zero every member for the next measurement.
    ///
    /// # Errors
    ///
    /// Returns an error if the group cannot be reset.
    fn reset(&mut self, group: &mut Self::Group) -> io::Result<()>;

    /// Release backend-wide resources. Groups must already be dropped.
    fn shutdown(&mut self);
}

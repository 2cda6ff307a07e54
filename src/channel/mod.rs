//! Communicator module for readiness checks against managed machines.
//!
//! This module provides the trait every communicator backend implements and
//! the no-op backend used when a machine has no discoverable network
//! identity. Real backends (SSH, WinRM) live with the host orchestrator.

pub mod noop;

pub use noop::NoopChannel;

/// Trait for communicator backend implementations.
///
/// The host orchestrator only ever asks a communicator whether the machine
/// can accept remote commands; it never inspects backend internals.
pub trait Channel: Send + Sync {
    /// Returns the registry identity of this communicator.
    fn name(&self) -> &'static str;

    /// Returns true if the machine can accept remote commands right now.
    fn is_ready(&self) -> bool;

    /// Waits until the machine is ready or the budget runs out.
    ///
    /// # Arguments
    /// * `timeout_secs` - Time budget in seconds. Backends decide how to treat
    ///   zero or negative budgets.
    ///
    /// # Returns
    /// True once the machine is ready, false if the budget was exhausted.
    fn wait_for_ready(&self, timeout_secs: i64) -> bool;
}

//! Guest module for guest-OS specific configuration capabilities.
//!
//! A guest adapter exposes a set of named capabilities (change the host
//! name, configure networks, mount shared folders, ...). Capabilities are
//! registered one by one in the [`Registry`](crate::registry::Registry) and
//! invoked through the [`CapabilityHandler`] trait, so the host never needs
//! the concrete guest type.

pub mod noop;

use strum::{AsRefStr, Display, EnumIter, EnumString};

pub use noop::NoopGuest;

/// A positional capability argument.
///
/// Capabilities receive whatever the host passes for them: a host name
/// string, a list of network descriptors, a shared-folder mapping. The value
/// is dynamically typed so a handler never rejects an argument because of its
/// shape.
pub type CapabilityArg = serde_yaml::Value;

/// Trait for guest adapter implementations.
pub trait Guest: Send + Sync {
    /// Returns the registry identity of this guest.
    fn name(&self) -> &'static str;
}

/// Handler for one named guest capability.
///
/// Handlers are stateless values shared through the registry, so they must
/// be `Send + Sync`.
pub trait CapabilityHandler: Send + Sync {
    /// Invokes the capability with the given positional arguments.
    ///
    /// Returns the capability's success indicator.
    fn invoke(&self, args: &[CapabilityArg]) -> bool;
}

impl<F> CapabilityHandler for F
where
    F: Fn(&[CapabilityArg]) -> bool + Send + Sync,
{
    fn invoke(&self, args: &[CapabilityArg]) -> bool {
        self(args)
    }
}

/// Capability names the host orchestrator conventionally invokes.
///
/// The registry itself is keyed by plain strings, so guests may register
/// capabilities outside this list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Set the guest's host name. Conventional argument: the host name.
    ChangeHostName,
    /// Configure network interfaces. Conventional argument: a list of
    /// interface descriptors.
    ConfigureNetworks,
    /// Mount a VirtualBox shared folder. Conventional arguments: the folder
    /// name, guest path and mount options.
    MountVirtualboxSharedFolder,
}

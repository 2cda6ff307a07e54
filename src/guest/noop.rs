//! No-op guest.
//!
//! Used when a machine is running but cannot be reached: every configuration
//! capability reports success without touching the machine.

use tracing::debug;

use super::{Capability, CapabilityArg, Guest};

/// Registry identity of the no-op guest.
pub const NOOP_GUEST: &str = "noop_guest";

/// Guest whose capabilities all succeed without doing anything.
///
/// All capabilities are associated functions; there is no per-machine state.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGuest;

impl NoopGuest {
    /// Capabilities provided by this guest, in registration order.
    pub const CAPABILITIES: [Capability; 3] = [
        Capability::ChangeHostName,
        Capability::ConfigureNetworks,
        Capability::MountVirtualboxSharedFolder,
    ];

    /// Reports the host name as changed without touching the machine.
    pub fn change_host_name(args: &[CapabilityArg]) -> bool {
        skip(Capability::ChangeHostName, args)
    }

    /// Reports networks as configured; interface descriptors are ignored.
    pub fn configure_networks(args: &[CapabilityArg]) -> bool {
        skip(Capability::ConfigureNetworks, args)
    }

    /// Reports the shared folder as mounted without mounting anything.
    pub fn mount_virtualbox_shared_folder(args: &[CapabilityArg]) -> bool {
        skip(Capability::MountVirtualboxSharedFolder, args)
    }

    /// Returns the handler function for a capability.
    pub fn handler(capability: Capability) -> fn(&[CapabilityArg]) -> bool {
        match capability {
            Capability::ChangeHostName => Self::change_host_name,
            Capability::ConfigureNetworks => Self::configure_networks,
            Capability::MountVirtualboxSharedFolder => Self::mount_virtualbox_shared_folder,
        }
    }
}

impl Guest for NoopGuest {
    fn name(&self) -> &'static str {
        NOOP_GUEST
    }
}

fn skip(capability: Capability, args: &[CapabilityArg]) -> bool {
    debug!(%capability, args = args.len(), "noop guest: skipping capability");
    true
}

//! Plugin registration.
//!
//! A plugin bundles a human-readable name and description with a set of
//! registrations. The host installs plugins into a
//! [`RegistryBuilder`] once at startup, then freezes the builder.

use crate::channel::{Channel, NoopChannel, noop::NOOP_CHANNEL};
use crate::error::VmnoopError;
use crate::guest::{Guest, NoopGuest, noop::NOOP_GUEST};
use crate::registry::{DuplicatePolicy, Registry, RegistryBuilder};

/// Plugin metadata recorded by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub description: String,
}

/// Trait for plugins contributing communicators, guests and capabilities.
pub trait Plugin {
    /// Human-readable plugin name.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Registers everything this plugin provides.
    fn register(&self, builder: &mut RegistryBuilder) -> Result<(), VmnoopError>;

    /// Returns the metadata stored in the registry.
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// Plugin providing the `noop` communicator and the `noop_guest` guest.
///
/// Installed when machines may lack a discoverable network identity, so they
/// can be booted without any SSH-dependent step.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPlugin;

impl Plugin for NoopPlugin {
    fn name(&self) -> &str {
        "Noop communicator/guest"
    }

    fn description(&self) -> &str {
        "Noop communicator/guest"
    }

    fn register(&self, builder: &mut RegistryBuilder) -> Result<(), VmnoopError> {
        builder.register_channel(NOOP_CHANNEL, || Box::new(NoopChannel) as Box<dyn Channel>)?;
        builder.register_guest(NOOP_GUEST, || Box::new(NoopGuest) as Box<dyn Guest>)?;
        for capability in NoopGuest::CAPABILITIES {
            builder.register_guest_capability(
                NOOP_GUEST,
                capability.as_ref(),
                NoopGuest::handler(capability),
            )?;
        }
        Ok(())
    }
}

/// Builds a registry with the built-in plugins installed.
///
/// The built-in plugins use disjoint names, so both policies yield the same
/// bindings; `policy` is carried for registrations made on top of them.
pub fn default_registry(policy: DuplicatePolicy) -> Result<Registry, VmnoopError> {
    let mut builder = RegistryBuilder::with_policy(policy);
    builder.install(&NoopPlugin)?;
    builder.build()
}

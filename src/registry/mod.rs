//! Capability registry binding names to communicator and guest backends.
//!
//! The registry has two states, expressed as two types:
//!
//! - [`RegistryBuilder`]: *unpopulated*. Plugins register communicators,
//!   guests and guest capabilities into it. Mutation needs `&mut`, so there is
//!   always a single writer.
//! - [`Registry`]: *populated*. Produced by [`RegistryBuilder::build`], which
//!   consumes the builder. It is immutable, `Send + Sync`, and can be shared
//!   freely (`&Registry` or `Arc<Registry>`) for lock-free lookups.
//!
//! If registration or `build` fails, no `Registry` exists at all, so a
//! partially populated registry is never observable. A plugin whose
//! registrations fail midway is rolled back by [`RegistryBuilder::install`],
//! so the builder never holds half of a plugin either.

mod identifier;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::error::VmnoopError;
use crate::guest::{CapabilityArg, CapabilityHandler, Guest};
use crate::plugin::{Plugin, PluginInfo};

use identifier::validate_identifier;

/// Factory producing a communicator instance.
pub type ChannelFactory = Arc<dyn Fn() -> Box<dyn Channel> + Send + Sync>;

/// Factory producing a guest instance.
pub type GuestFactory = Arc<dyn Fn() -> Box<dyn Guest> + Send + Sync>;

/// Shared, stateless capability handler.
pub type SharedHandler = Arc<dyn CapabilityHandler>;

/// Namespaces an identity can be registered in.
///
/// Communicator and guest names are independent: `noop` may name both a
/// communicator and a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Namespace {
    #[strum(serialize = "communicator")]
    Communicator,
    #[strum(serialize = "guest")]
    Guest,
    #[strum(serialize = "guest capability")]
    GuestCapability,
}

/// What to do when an identity is registered twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with [`VmnoopError::DuplicateRegistration`] (default).
    #[default]
    Reject,
    /// Keep the most recent registration and log a warning.
    Replace,
}

/// Inserts `value` under `key`, honoring the duplicate policy.
fn insert_binding<V>(
    map: &mut BTreeMap<String, V>,
    policy: DuplicatePolicy,
    namespace: Namespace,
    key: &str,
    label: impl FnOnce() -> String,
    value: V,
) -> Result<(), VmnoopError> {
    match map.entry(key.to_string()) {
        Entry::Vacant(entry) => {
            entry.insert(value);
        }
        Entry::Occupied(mut entry) => match policy {
            DuplicatePolicy::Reject => {
                return Err(VmnoopError::DuplicateRegistration {
                    namespace,
                    name: label(),
                });
            }
            DuplicatePolicy::Replace => {
                warn!("replacing previously registered {} '{}'", namespace, label());
                entry.insert(value);
            }
        },
    }
    Ok(())
}

/// Mutable registry under construction.
pub struct RegistryBuilder {
    policy: DuplicatePolicy,
    plugins: Vec<PluginInfo>,
    channels: BTreeMap<String, ChannelFactory>,
    guests: BTreeMap<String, GuestFactory>,
    capabilities: BTreeMap<String, BTreeMap<String, SharedHandler>>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Creates an empty builder that rejects duplicate registrations.
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::default())
    }

    /// Creates an empty builder with an explicit duplicate policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            plugins: Vec::new(),
            channels: BTreeMap::new(),
            guests: BTreeMap::new(),
            capabilities: BTreeMap::new(),
        }
    }

    /// Returns the duplicate policy in effect.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Records a plugin's metadata and runs its registrations.
    ///
    /// Installation is all or nothing: if any registration fails, every
    /// binding the plugin made so far is rolled back. Installing the same
    /// plugin again (under `Replace`) records its metadata only once.
    pub fn install(&mut self, plugin: &dyn Plugin) -> Result<(), VmnoopError> {
        debug!(plugin = plugin.name(), "installing plugin");
        let channels = self.channels.clone();
        let guests = self.guests.clone();
        let capabilities = self.capabilities.clone();

        if let Err(e) = plugin.register(self) {
            self.channels = channels;
            self.guests = guests;
            self.capabilities = capabilities;
            debug!(plugin = plugin.name(), "rolled back partial plugin registration");
            return Err(e);
        }

        let info = plugin.info();
        if !self.plugins.contains(&info) {
            self.plugins.push(info);
        }
        Ok(())
    }

    /// Binds a communicator name to a factory.
    pub fn register_channel<F>(&mut self, name: &str, factory: F) -> Result<(), VmnoopError>
    where
        F: Fn() -> Box<dyn Channel> + Send + Sync + 'static,
    {
        validate_identifier(Namespace::Communicator, name)?;
        insert_binding(
            &mut self.channels,
            self.policy,
            Namespace::Communicator,
            name,
            || name.to_string(),
            Arc::new(factory) as ChannelFactory,
        )?;
        debug!(communicator = name, "registered communicator");
        Ok(())
    }

    /// Binds a guest name to a factory.
    pub fn register_guest<F>(&mut self, name: &str, factory: F) -> Result<(), VmnoopError>
    where
        F: Fn() -> Box<dyn Guest> + Send + Sync + 'static,
    {
        validate_identifier(Namespace::Guest, name)?;
        insert_binding(
            &mut self.guests,
            self.policy,
            Namespace::Guest,
            name,
            || name.to_string(),
            Arc::new(factory) as GuestFactory,
        )?;
        debug!(guest = name, "registered guest");
        Ok(())
    }

    /// Binds one capability of one guest to a handler.
    ///
    /// The guest may be registered before or after its capabilities; the
    /// pairing is checked by [`build`](Self::build).
    pub fn register_guest_capability<H>(
        &mut self,
        guest: &str,
        capability: &str,
        handler: H,
    ) -> Result<(), VmnoopError>
    where
        H: CapabilityHandler + 'static,
    {
        validate_identifier(Namespace::Guest, guest)?;
        validate_identifier(Namespace::GuestCapability, capability)?;
        let handlers = self.capabilities.entry(guest.to_string()).or_default();
        let inserted = insert_binding(
            handlers,
            self.policy,
            Namespace::GuestCapability,
            capability,
            || format!("{}.{}", guest, capability),
            Arc::new(handler) as SharedHandler,
        );
        if inserted.is_err() && handlers.is_empty() {
            self.capabilities.remove(guest);
        }
        inserted?;
        debug!(guest, capability, "registered guest capability");
        Ok(())
    }

    /// Finishes initialization and freezes the registry.
    ///
    /// Fails if a capability was bound to a guest that was never registered.
    pub fn build(self) -> Result<Registry, VmnoopError> {
        if let Some((guest, handlers)) = self
            .capabilities
            .iter()
            .find(|(guest, _)| !self.guests.contains_key(*guest))
        {
            let capability = handlers.keys().next().cloned().unwrap_or_default();
            return Err(VmnoopError::OrphanCapability {
                guest: guest.clone(),
                capability,
            });
        }

        debug!(
            plugins = self.plugins.len(),
            communicators = self.channels.len(),
            guests = self.guests.len(),
            "registry populated"
        );

        Ok(Registry {
            plugins: self.plugins,
            channels: self.channels,
            guests: self.guests,
            capabilities: self.capabilities,
        })
    }
}

/// Populated, read-only registry.
pub struct Registry {
    plugins: Vec<PluginInfo>,
    channels: BTreeMap<String, ChannelFactory>,
    guests: BTreeMap<String, GuestFactory>,
    capabilities: BTreeMap<String, BTreeMap<String, SharedHandler>>,
}

impl Registry {
    /// Returns a builder for a new registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Metadata of installed plugins, in install order.
    pub fn plugins(&self) -> &[PluginInfo] {
        &self.plugins
    }

    /// Sorted communicator names.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Sorted guest names.
    pub fn guest_names(&self) -> impl Iterator<Item = &str> {
        self.guests.keys().map(String::as_str)
    }

    /// Sorted capability names registered for `guest`.
    ///
    /// Empty if the guest is unknown or has no capabilities.
    pub fn guest_capabilities(&self, guest: &str) -> impl Iterator<Item = &str> {
        self.capabilities
            .get(guest)
            .into_iter()
            .flat_map(|handlers| handlers.keys().map(String::as_str))
    }

    /// Returns true if `guest` has a handler for `capability`.
    pub fn has_guest_capability(&self, guest: &str, capability: &str) -> bool {
        self.capabilities
            .get(guest)
            .is_some_and(|handlers| handlers.contains_key(capability))
    }

    /// Looks up the factory of a communicator.
    pub fn resolve_channel(&self, name: &str) -> Result<&ChannelFactory, VmnoopError> {
        self.channels.get(name).ok_or_else(|| VmnoopError::NotFound {
            namespace: Namespace::Communicator,
            name: name.to_string(),
        })
    }

    /// Looks up the factory of a guest.
    pub fn resolve_guest(&self, name: &str) -> Result<&GuestFactory, VmnoopError> {
        self.guests.get(name).ok_or_else(|| VmnoopError::NotFound {
            namespace: Namespace::Guest,
            name: name.to_string(),
        })
    }

    /// Looks up the handler of one guest capability.
    ///
    /// Fails with `NotFound` for an unknown guest and with
    /// `UnsupportedCapability` for a known guest lacking the capability.
    pub fn resolve_guest_capability(
        &self,
        guest: &str,
        capability: &str,
    ) -> Result<&SharedHandler, VmnoopError> {
        self.resolve_guest(guest)?;
        self.capabilities
            .get(guest)
            .and_then(|handlers| handlers.get(capability))
            .ok_or_else(|| VmnoopError::UnsupportedCapability {
                guest: guest.to_string(),
                capability: capability.to_string(),
            })
    }

    /// Resolves a communicator and constructs an instance.
    pub fn channel(&self, name: &str) -> Result<Box<dyn Channel>, VmnoopError> {
        Ok((self.resolve_channel(name)?)())
    }

    /// Resolves a guest and constructs an instance.
    pub fn guest(&self, name: &str) -> Result<Box<dyn Guest>, VmnoopError> {
        Ok((self.resolve_guest(name)?)())
    }

    /// Resolves and invokes a guest capability.
    ///
    /// `Ok(result)` carries the handler's own success indicator; `Err` means
    /// the capability could not be resolved at all.
    pub fn invoke_guest_capability(
        &self,
        guest: &str,
        capability: &str,
        args: &[CapabilityArg],
    ) -> Result<bool, VmnoopError> {
        let handler = self.resolve_guest_capability(guest, capability)?;
        let result = handler.invoke(args);
        debug!(guest, capability, result, "invoked guest capability");
        Ok(result)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capabilities: BTreeMap<&str, Vec<&str>> = self
            .capabilities
            .iter()
            .map(|(guest, handlers)| (guest.as_str(), handlers.keys().map(String::as_str).collect()))
            .collect();
        f.debug_struct("Registry")
            .field("plugins", &self.plugins)
            .field("communicators", &self.channels.keys().collect::<Vec<_>>())
            .field("guests", &self.guests.keys().collect::<Vec<_>>())
            .field("capabilities", &capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::NoopChannel;
    use crate::guest::NoopGuest;
    use crate::plugin::NoopPlugin;

    fn noop_channel() -> Box<dyn Channel> {
        Box::new(NoopChannel)
    }

    fn noop_guest() -> Box<dyn Guest> {
        Box::new(NoopGuest)
    }

    #[test]
    fn registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }

    #[test]
    fn duplicate_channel_rejected_by_default() {
        let mut builder = RegistryBuilder::new();
        builder.register_channel("noop", noop_channel).unwrap();
        let err = builder.register_channel("noop", noop_channel).unwrap_err();
        assert!(matches!(
            err,
            VmnoopError::DuplicateRegistration {
                namespace: Namespace::Communicator,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_replaced_with_replace_policy() {
        let mut builder = RegistryBuilder::with_policy(DuplicatePolicy::Replace);
        builder.register_guest("g", noop_guest).unwrap();
        builder
            .register_guest_capability("g", "probe", |_: &[CapabilityArg]| false)
            .unwrap();
        builder
            .register_guest_capability("g", "probe", |_: &[CapabilityArg]| true)
            .unwrap();
        let registry = builder.build().unwrap();
        assert!(registry.invoke_guest_capability("g", "probe", &[]).unwrap());
    }

    #[test]
    fn channel_and_guest_namespaces_are_separate() {
        let mut builder = RegistryBuilder::new();
        builder.register_channel("noop", noop_channel).unwrap();
        builder.register_guest("noop", noop_guest).unwrap();
        let registry = builder.build().unwrap();
        assert!(registry.resolve_channel("noop").is_ok());
        assert!(registry.resolve_guest("noop").is_ok());
    }

    #[test]
    fn capability_for_unregistered_guest_fails_build() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_guest_capability("ghost", "change_host_name", NoopGuest::change_host_name)
            .unwrap();
        let err = builder.build().unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, VmnoopError::OrphanCapability { ref guest, .. } if guest == "ghost"));
    }

    #[test]
    fn invalid_name_rejected() {
        let mut builder = RegistryBuilder::new();
        let err = builder.register_channel("no op", noop_channel).unwrap_err();
        assert!(matches!(err, VmnoopError::InvalidIdentifier { .. }));
    }

    #[test]
    fn unknown_guest_versus_unsupported_capability() {
        let mut builder = RegistryBuilder::new();
        builder.register_guest("noop_guest", noop_guest).unwrap();
        let registry = builder.build().unwrap();

        let err = registry
            .resolve_guest_capability("linux", "change_host_name")
            .err()
            .unwrap();
        assert!(matches!(err, VmnoopError::NotFound { namespace: Namespace::Guest, .. }));

        let err = registry
            .resolve_guest_capability("noop_guest", "change_host_name")
            .err()
            .unwrap();
        assert!(matches!(err, VmnoopError::UnsupportedCapability { .. }));
    }

    #[test]
    fn debug_lists_names() {
        let mut builder = RegistryBuilder::new();
        builder.register_channel("noop", noop_channel).unwrap();
        let registry = builder.build().unwrap();
        let debug = format!("{:?}", registry);
        assert!(debug.contains("communicators: [\"noop\"]"), "{}", debug);
    }

    #[test]
    fn failed_install_rolls_back_partial_bindings() {
        let mut builder = RegistryBuilder::new();
        builder.register_guest("noop_guest", noop_guest).unwrap();

        let err = builder.install(&NoopPlugin).unwrap_err();
        assert!(matches!(
            err,
            VmnoopError::DuplicateRegistration {
                namespace: Namespace::Guest,
                ..
            }
        ));

        let registry = builder.build().unwrap();
        assert_eq!(registry.channel_names().count(), 0);
        assert_eq!(registry.guest_names().collect::<Vec<_>>(), ["noop_guest"]);
        assert_eq!(registry.guest_capabilities("noop_guest").count(), 0);
        assert!(registry.plugins().is_empty());
    }

    #[test]
    fn duplicate_guest_rejected_by_default() {
        let mut builder = RegistryBuilder::new();
        builder.register_guest("noop_guest", noop_guest).unwrap();
        let err = builder.register_guest("noop_guest", noop_guest).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            VmnoopError::DuplicateRegistration {
                namespace: Namespace::Guest,
                ref name,
            } if name == "noop_guest"
        ));
    }

    #[test]
    fn reinstalling_plugin_with_replace_records_it_once() {
        let mut builder = RegistryBuilder::with_policy(DuplicatePolicy::Replace);
        builder.install(&NoopPlugin).unwrap();
        builder.install(&NoopPlugin).unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(registry.plugins().len(), 1);
    }
}

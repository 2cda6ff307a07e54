//! Machine manifest loading and backend selection.
//!
//! The manifest lists the machines the host manages. For each machine the
//! host picks a communicator and a guest: explicit overrides win, a machine
//! without a known address falls back to the no-op backends, and everything
//! else uses the manifest defaults.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::noop::NOOP_CHANNEL;
use crate::error::VmnoopError;
use crate::guest::noop::NOOP_GUEST;
use crate::registry::DuplicatePolicy;

/// Default boot timeout in seconds.
pub const DEFAULT_BOOT_TIMEOUT: i64 = 300;

fn default_communicator() -> String {
    "ssh".to_string()
}

fn default_guest() -> String {
    "linux".to_string()
}

fn default_boot_timeout() -> i64 {
    DEFAULT_BOOT_TIMEOUT
}

/// Root manifest.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub machines: Vec<Machine>,
}

/// Backends used for machines with a known address.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    #[serde(default = "default_communicator")]
    pub communicator: String,
    #[serde(default = "default_guest")]
    pub guest: String,
    /// Readiness budget in seconds passed to `wait_for_ready`.
    #[serde(default = "default_boot_timeout")]
    pub boot_timeout: i64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            communicator: default_communicator(),
            guest: default_guest(),
            boot_timeout: DEFAULT_BOOT_TIMEOUT,
        }
    }
}

/// Registry settings.
///
/// `duplicate_policy` governs collisions between installed plugins. The
/// built-in plugin set never registers a name twice, so the setting only
/// changes behavior once additional plugins share identities with it.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RegistrySettings {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

/// One managed machine.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Machine {
    pub name: String,
    /// Reachable address, if one was discovered.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub communicator: Option<String>,
    #[serde(default)]
    pub guest: Option<String>,
    #[serde(default)]
    pub boot_timeout: Option<i64>,
}

/// Backends chosen for one machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub communicator: String,
    pub guest: String,
    pub boot_timeout: i64,
    /// True when the no-op fallback was picked because the address is unknown.
    pub fallback: bool,
}

impl Machine {
    /// Returns true if the machine has a non-blank address.
    pub fn has_address(&self) -> bool {
        self.address.as_deref().is_some_and(|a| !a.trim().is_empty())
    }

    /// Chooses the communicator and guest for this machine.
    ///
    /// Per-field precedence: explicit override, then the no-op fallback when
    /// the machine has no address, then the manifest defaults.
    pub fn selection(&self, defaults: &Defaults) -> Selection {
        let fallback = !self.has_address();
        let communicator = match (&self.communicator, fallback) {
            (Some(name), _) => name.clone(),
            (None, true) => NOOP_CHANNEL.to_string(),
            (None, false) => defaults.communicator.clone(),
        };
        let guest = match (&self.guest, fallback) {
            (Some(name), _) => name.clone(),
            (None, true) => NOOP_GUEST.to_string(),
            (None, false) => defaults.guest.clone(),
        };
        let selection = Selection {
            communicator,
            guest,
            boot_timeout: self.boot_timeout.unwrap_or(defaults.boot_timeout),
            fallback,
        };
        debug!(machine = %self.name, ?selection, "selected backends");
        selection
    }
}

impl Manifest {
    /// Validates machine names and explicit overrides.
    pub fn validate(&self) -> Result<(), VmnoopError> {
        let mut seen = HashSet::new();
        for (index, machine) in self.machines.iter().enumerate() {
            if machine.name.trim().is_empty() {
                return Err(VmnoopError::Validation(format!(
                    "machine {} has an empty name",
                    index + 1
                )));
            }
            if !seen.insert(machine.name.as_str()) {
                return Err(VmnoopError::Validation(format!(
                    "duplicate machine name '{}'",
                    machine.name
                )));
            }
            for (field, value) in [
                ("communicator", &machine.communicator),
                ("guest", &machine.guest),
            ] {
                if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                    return Err(VmnoopError::Validation(format!(
                        "machine '{}': {} must not be empty",
                        machine.name, field
                    )));
                }
            }
        }
        if self.defaults.communicator.trim().is_empty() || self.defaults.guest.trim().is_empty() {
            return Err(VmnoopError::Validation(
                "default communicator and guest must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads a manifest from a YAML file.
pub fn load_manifest(path: &Utf8Path) -> Result<Manifest, VmnoopError> {
    let file = File::open(path).map_err(|e| VmnoopError::io(path.as_str(), e))?;
    let reader = BufReader::new(file);
    serde_yaml::from_reader(reader)
        .map_err(|e| VmnoopError::Config(format!("failed to parse {}: {}", path, e)))
}

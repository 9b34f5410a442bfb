//! The catalogue of verification scenarios.

use std::fmt;

use crate::domain::error::ConfigError;

/// How a scenario obtains provisioned infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Applies and destroys its own copy of the configuration.
    Scoped,
    /// Uses the one-time shared setup.
    Shared,
}

/// A verification scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// The VM exists after apply.
    VmCreation,
    /// The NIC exists and is attached to the VM.
    NicExistsAndAttached,
    /// The VM runs the expected Ubuntu image.
    UbuntuImage,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::VmCreation,
        Scenario::NicExistsAndAttached,
        Scenario::UbuntuImage,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::VmCreation => "vm_creation",
            Self::NicExistsAndAttached => "nic_exists_and_attached",
            Self::UbuntuImage => "ubuntu_image",
        }
    }

    #[must_use]
    pub fn strategy(self) -> Strategy {
        match self {
            Self::VmCreation => Strategy::Scoped,
            Self::NicExistsAndAttached | Self::UbuntuImage => Strategy::Shared,
        }
    }

    /// Look up a scenario by its name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownScenario` listing the valid names.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| ConfigError::UnknownScenario {
                name: name.to_string(),
                valid: Self::ALL.map(Scenario::name).join(", "),
            })
    }

    /// Resolve a name filter; an empty filter selects every scenario.
    ///
    /// # Errors
    ///
    /// Returns the first unknown name.
    pub fn select(names: &[String]) -> Result<Vec<Self>, ConfigError> {
        if names.is_empty() {
            return Ok(Self::ALL.to_vec());
        }
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let scenario = Self::from_name(name)?;
            if !selected.contains(&scenario) {
                selected.push(scenario);
            }
        }
        Ok(selected)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

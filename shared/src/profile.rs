use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine variant handed to the simulator on launch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MachineProfile {
    #[default]
    Full,
    Lite,
}

impl MachineProfile {
    pub const ALL: [MachineProfile; 2] = [MachineProfile::Full, MachineProfile::Lite];

    /// Identifier the simulator module expects in `launch`.
    pub fn launch_id(self) -> &'static str {
        match self {
            MachineProfile::Full => "commodore_pet",
            MachineProfile::Lite => "commodore_pet_lite",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MachineProfile::Full => "Commodore PET 2001N",
            MachineProfile::Lite => "Commodore PET 2001N (lite)",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "full" => Some(MachineProfile::Full),
            "lite" => Some(MachineProfile::Lite),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            MachineProfile::Full => "full",
            MachineProfile::Lite => "lite",
        }
    }

    /// Placeholder text for a sheet this profile does not render.
    pub fn excluded_notice(self, page: u8) -> Option<&'static str> {
        match (self, page) {
            (MachineProfile::Full, _) => None,
            (MachineProfile::Lite, 6) => Some(
                "The components of the master timing circuit are not emulated \
                 in the lite version for performance reasons.",
            ),
            (MachineProfile::Lite, 7..) => Some(
                "The display logic is not emulated in the lite version for \
                 performance reasons. The screen is driven directly from video memory.",
            ),
            (MachineProfile::Lite, _) => None,
        }
    }
}

impl fmt::Display for MachineProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

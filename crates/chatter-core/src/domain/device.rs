//! Physical input device identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque device handle as reported in the raw input header (`hDevice`).
///
/// The value is only meaningful for equality comparisons within one boot of
/// the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub isize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

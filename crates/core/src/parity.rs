//! Mirror parity through the z = 0 plane for two-dimensional cells.

use serde::{Deserialize, Serialize};

use crate::geometry::Component;

/// `EvenZ` selects the TE-like family (Hz, Ex, Ey); `OddZ` the TM-like
/// family (Ez, Hx, Hy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    None,
    #[serde(alias = "te", alias = "TE")]
    EvenZ,
    #[serde(alias = "tm", alias = "TM")]
    OddZ,
}

impl Parity {
    pub fn admits_2d(self, c: Component) -> bool {
        match self {
            Parity::None => true,
            Parity::EvenZ => !c.is_tm_2d(),
            Parity::OddZ => c.is_tm_2d(),
        }
    }
}

//! Per-class ceilings.
//!
//! Each action class carries a per-minute and a per-hour ceiling. Both are
//! evaluated against the same request history.

use serde::{Deserialize, Serialize};

use super::class::ActionClass;

/// Maximum admitted requests per trailing minute and per trailing hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ceiling {
    /// Requests allowed within any trailing 60 seconds
    pub per_minute: u32,
    /// Requests allowed within any trailing hour
    pub per_hour: u32,
}

impl Ceiling {
    pub const fn new(per_minute: u32, per_hour: u32) -> Self {
        Self {
            per_minute,
            per_hour,
        }
    }
}

/// Ceilings for every action class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRules {
    /// Ordinary API traffic
    #[serde(default = "default_general")]
    pub general: Ceiling,

    /// Authentication attempts
    #[serde(default = "default_login")]
    pub login: Ceiling,
}

impl Default for LimitRules {
    fn default() -> Self {
        Self {
            general: default_general(),
            login: default_login(),
        }
    }
}

fn default_general() -> Ceiling {
    Ceiling::new(60, 1000)
}

fn default_login() -> Ceiling {
    Ceiling::new(5, 20)
}

impl LimitRules {
    /// Find the ceiling that applies to a class.
    pub fn ceiling(&self, class: ActionClass) -> Ceiling {
        match class {
            ActionClass::General => self.general,
            ActionClass::Login => self.login,
        }
    }
}

//! Static reference data: reporting frameworks and selectable run lengths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Regulatory framework whose gap-handling rules the service applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jurisdiction {
    #[default]
    Epa,
    Alberta,
    Lcfs,
    Puro,
}

impl Jurisdiction {
    pub const ALL: [Jurisdiction; 4] = [
        Jurisdiction::Epa,
        Jurisdiction::Alberta,
        Jurisdiction::Lcfs,
        Jurisdiction::Puro,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Jurisdiction::Epa => "epa",
            Jurisdiction::Alberta => "alberta",
            Jurisdiction::Lcfs => "lcfs",
            Jurisdiction::Puro => "puro",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Jurisdiction::Epa => "EPA Subpart RR",
            Jurisdiction::Alberta => "Alberta TIER",
            Jurisdiction::Lcfs => "California LCFS",
            Jurisdiction::Puro => "Puro Biochar",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Jurisdiction::Epa => {
                "U.S. geologic sequestration focus; emphasizes documented substitutions and reporting transparency."
            }
            Jurisdiction::Alberta => {
                "Tiered approach; stricter treatment for direct measurement gaps and deviation handling."
            }
            Jurisdiction::Lcfs => {
                "Crediting-oriented framework; missing periods are generally treated conservatively."
            }
            Jurisdiction::Puro => {
                "Biochar methodology; short-gap interpolation with conservative fallback for longer gaps."
            }
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Jurisdiction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Jurisdiction::ALL
            .into_iter()
            .find(|j| j.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown jurisdiction: {s}")))
    }
}

/// Run length offered to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SimulationDuration {
    Five,
    #[default]
    Twelve,
    Thirty,
    Sixty,
}

impl SimulationDuration {
    pub const ALL: [SimulationDuration; 4] = [
        SimulationDuration::Five,
        SimulationDuration::Twelve,
        SimulationDuration::Thirty,
        SimulationDuration::Sixty,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            SimulationDuration::Five => 5,
            SimulationDuration::Twelve => 12,
            SimulationDuration::Thirty => 30,
            SimulationDuration::Sixty => 60,
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.minutes() == minutes)
    }
}

impl fmt::Display for SimulationDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}

impl FromStr for SimulationDuration {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_end_matches("min")
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::from_minutes)
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Duration must be one of 5, 12, 30, 60 minutes: {s}"))
            })
    }
}

//! Dental chart models.
//!
//! Tooth positions use two-digit quadrant notation: the first digit is the
//! quadrant (1 upper-right, 2 upper-left, 3 lower-left, 4 lower-right) and the
//! second is the position from the midline (1-8).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of permanent teeth tracked on a chart.
pub const TOOTH_COUNT: usize = 32;

/// One of the four mouth quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl Quadrant {
    /// All quadrants in chart order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UpperRight,
        Quadrant::UpperLeft,
        Quadrant::LowerLeft,
        Quadrant::LowerRight,
    ];

    /// Numeric quadrant code (1-4).
    pub fn code(self) -> u8 {
        match self {
            Quadrant::UpperRight => 1,
            Quadrant::UpperLeft => 2,
            Quadrant::LowerLeft => 3,
            Quadrant::LowerRight => 4,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Quadrant::UpperRight),
            2 => Some(Quadrant::UpperLeft),
            3 => Some(Quadrant::LowerLeft),
            4 => Some(Quadrant::LowerRight),
            _ => None,
        }
    }

    pub fn is_upper(self) -> bool {
        matches!(self, Quadrant::UpperRight | Quadrant::UpperLeft)
    }
}

/// A canonical tooth position id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToothId {
    quadrant: Quadrant,
    number: u8,
}

/// Error for malformed tooth ids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tooth id: {0}")]
pub struct InvalidToothId(pub String);

impl ToothId {
    /// Build a tooth id, validating the position number.
    pub fn new(quadrant: Quadrant, number: u8) -> Result<Self, InvalidToothId> {
        if !(1..=8).contains(&number) {
            return Err(InvalidToothId(format!("{}{}", quadrant.code(), number)));
        }
        Ok(Self { quadrant, number })
    }

    pub fn quadrant(&self) -> Quadrant {
        self.quadrant
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// All 32 positions, 8 per quadrant, in chart order.
    pub fn all() -> impl Iterator<Item = ToothId> {
        Quadrant::ALL
            .into_iter()
            .flat_map(|quadrant| (1..=8).map(move |number| ToothId { quadrant, number }))
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.quadrant.code(), self.number)
    }
}

impl FromStr for ToothId {
    type Err = InvalidToothId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(InvalidToothId(s.to_string()));
        }
        let quadrant =
            Quadrant::from_code(bytes[0] - b'0').ok_or_else(|| InvalidToothId(s.to_string()))?;
        ToothId::new(quadrant, bytes[1] - b'0').map_err(|_| InvalidToothId(s.to_string()))
    }
}

impl TryFrom<String> for ToothId {
    type Error = InvalidToothId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ToothId> for String {
    fn from(id: ToothId) -> Self {
        id.to_string()
    }
}

/// Clinical status of a single tooth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToothStatus {
    #[default]
    Healthy,
    Filling,
    Crown,
    Missing,
    Implant,
    RootCanal,
    Cavity,
}

impl ToothStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToothStatus::Healthy => "healthy",
            ToothStatus::Filling => "filling",
            ToothStatus::Crown => "crown",
            ToothStatus::Missing => "missing",
            ToothStatus::Implant => "implant",
            ToothStatus::RootCanal => "root-canal",
            ToothStatus::Cavity => "cavity",
        }
    }
}

impl FromStr for ToothStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "healthy" => Ok(ToothStatus::Healthy),
            "filling" => Ok(ToothStatus::Filling),
            "crown" => Ok(ToothStatus::Crown),
            "missing" => Ok(ToothStatus::Missing),
            "implant" => Ok(ToothStatus::Implant),
            "root-canal" | "rootcanal" => Ok(ToothStatus::RootCanal),
            "cavity" => Ok(ToothStatus::Cavity),
            other => Err(format!("unknown tooth status: {}", other)),
        }
    }
}

/// Status and free-text notes for one tooth.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToothEntry {
    pub status: ToothStatus,
    #[serde(default)]
    pub notes: String,
}

impl ToothEntry {
    pub fn new(status: ToothStatus, notes: impl Into<String>) -> Self {
        Self {
            status,
            notes: notes.into(),
        }
    }
}

/// Stored chart data. May be sparse; see [`DentalChart::with_defaults`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DentalChart {
    teeth: BTreeMap<ToothId, ToothEntry>,
}

impl DentalChart {
    /// Empty (sparse) chart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chart with all 32 positions set to healthy.
    pub fn healthy() -> Self {
        Self {
            teeth: ToothId::all().map(|id| (id, ToothEntry::default())).collect(),
        }
    }

    /// Copy of this chart with every missing position defaulted to
    /// `{healthy, ""}`. The receiver is left untouched.
    pub fn with_defaults(&self) -> Self {
        let mut teeth = self.teeth.clone();
        for id in ToothId::all() {
            teeth.entry(id).or_default();
        }
        Self { teeth }
    }

    pub fn get(&self, id: &ToothId) -> Option<&ToothEntry> {
        self.teeth.get(id)
    }

    /// Status of a tooth, treating absent entries as healthy.
    pub fn status_of(&self, id: &ToothId) -> ToothStatus {
        self.teeth.get(id).map(|e| e.status).unwrap_or_default()
    }

    pub fn set(&mut self, id: ToothId, entry: ToothEntry) {
        self.teeth.insert(id, entry);
    }

    /// Number of stored entries (32 once defaults are merged).
    pub fn len(&self) -> usize {
        self.teeth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teeth.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        ToothId::all().all(|id| self.teeth.contains_key(&id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ToothId, &ToothEntry)> {
        self.teeth.iter()
    }

    /// Count of teeth per non-healthy status.
    pub fn status_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.teeth.values() {
            if entry.status != ToothStatus::Healthy {
                *counts.entry(entry.status.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Run status definitions matching the `run_status` storage enum.
///
/// The four statuses form a cycle: Upcoming -> Preloaded -> Complete ->
/// Cancelled -> Upcoming. Labels are stored and serialized exactly as
/// displayed on the dispatch board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "run_status")]
pub enum RunStatus {
    /// Initial state when a run is created
    Upcoming,
    /// Trailer has been preloaded for the run
    Preloaded,
    /// Run finished its delivery
    Complete,
    /// Run was called off
    Cancelled,
}

impl RunStatus {
    /// Check if this is a terminal state (the store is free for reassignment)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled)
    }

    /// The next status in the fixed display cycle
    pub fn successor(&self) -> Self {
        match self {
            Self::Upcoming => Self::Preloaded,
            Self::Preloaded => Self::Complete,
            Self::Complete => Self::Cancelled,
            Self::Cancelled => Self::Upcoming,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upcoming => write!(f, "Upcoming"),
            Self::Preloaded => write!(f, "Preloaded"),
            Self::Complete => write!(f, "Complete"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Upcoming" => Ok(Self::Upcoming),
            "Preloaded" => Ok(Self::Preloaded),
            "Complete" => Ok(Self::Complete),
            "Cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid run status: {s}")),
        }
    }
}

/// Default state for new runs
impl Default for RunStatus {
    fn default() -> Self {
        Self::Upcoming
    }
}

/// Daily dispatch window a run belongs to, matching the `run_type` storage
/// enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "run_type")]
pub enum RunType {
    Morning,
    Afternoon,
    #[serde(rename = "ADC")]
    #[sqlx(rename = "ADC")]
    Adc,
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Morning => write!(f, "Morning"),
            Self::Afternoon => write!(f, "Afternoon"),
            Self::Adc => write!(f, "ADC"),
        }
    }
}

impl std::str::FromStr for RunType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Morning" => Ok(Self::Morning),
            "Afternoon" => Ok(Self::Afternoon),
            "ADC" => Ok(Self::Adc),
            _ => Err(format!("Invalid run type: {s}")),
        }
    }
}

impl RunType {
    /// All windows in display order
    pub const ALL: [RunType; 3] = [RunType::Morning, RunType::Afternoon, RunType::Adc];
}

/// Truck assigned to a run, matching the `truck_type` storage enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "truck_type")]
pub enum TruckType {
    #[serde(rename = "Box Truck")]
    #[sqlx(rename = "Box Truck")]
    BoxTruck,
    #[serde(rename = "Tractor Trailer")]
    #[sqlx(rename = "Tractor Trailer")]
    TractorTrailer,
}

impl fmt::Display for TruckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoxTruck => write!(f, "Box Truck"),
            Self::TractorTrailer => write!(f, "Tractor Trailer"),
        }
    }
}

impl std::str::FromStr for TruckType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Box Truck" => Ok(Self::BoxTruck),
            "Tractor Trailer" => Ok(Self::TractorTrailer),
            _ => Err(format!("Invalid truck type: {s}")),
        }
    }
}

/// The four lifecycle instants recorded on a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampField {
    Start,
    Preload,
    Complete,
    Depart,
}

impl TimestampField {
    /// Storage column holding this instant
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Start => "start_time",
            Self::Preload => "preload_time",
            Self::Complete => "complete_time",
            Self::Depart => "depart_time",
        }
    }

    /// Status forced when this instant is stamped, if any
    pub fn forced_status(&self) -> Option<RunStatus> {
        match self {
            Self::Preload => Some(RunStatus::Preloaded),
            Self::Complete => Some(RunStatus::Complete),
            Self::Start | Self::Depart => None,
        }
    }
}

impl fmt::Display for TimestampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

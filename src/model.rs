use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ulid::Ulid;

/// Day of the week. Discriminants are the canonical index, Monday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Weekday> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exact, case-sensitive English names only.
impl FromStr for Weekday {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.name() == s)
            .ok_or_else(|| ParseError::Weekday(s.to_string()))
    }
}

/// Wall-clock time within a single day, minute precision.
///
/// Text form is zero-padded `HH:MM`; it is also the serde form, so slots
/// serialize the same way in JSON and in the WAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::Time(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(bad)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(h) || h.len() > 2 || !digits(m) || m.len() != 2 {
            return Err(bad());
        }
        let hour: u8 = h.parse().map_err(|_| bad())?;
        let minute: u8 = m.parse().map_err(|_| bad())?;
        TimeOfDay::new(hour, minute).ok_or_else(bad)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One recurring weekly opening window.
///
/// The day range is inclusive and may wrap past Sunday (Friday → Monday).
/// `close_time < open_time` marks an overnight window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    #[serde(rename = "startDay")]
    pub start_day: Weekday,
    #[serde(rename = "endDay")]
    pub end_day: Weekday,
    pub open_time: TimeOfDay,
    pub close_time: TimeOfDay,
}

impl AvailabilitySlot {
    pub fn new(start_day: Weekday, end_day: Weekday, open_time: TimeOfDay, close_time: TimeOfDay) -> Self {
        Self {
            start_day,
            end_day,
            open_time,
            close_time,
        }
    }

    pub fn is_single_day(&self) -> bool {
        self.start_day == self.end_day
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Weekday(String),
    Time(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Weekday(s) => write!(f, "invalid weekday: {s:?} (expected Monday..Sunday)"),
            ParseError::Time(s) => write!(f, "invalid time of day: {s:?} (expected HH:MM)"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone)]
pub struct TrackState {
    pub id: Ulid,
    pub name: Option<String>,
    /// Canonically sorted and free of overlaps.
    pub slots: Vec<AvailabilitySlot>,
    /// Set under the write lock once the track is deleted, or when its
    /// create failed. Holders of a stale handle must treat it as missing.
    pub deleted: bool,
}

impl TrackState {
    pub fn new(id: Ulid, name: Option<String>) -> Self {
        Self {
            id,
            name,
            slots: Vec::new(),
            deleted: false,
        }
    }
}

/// WAL record format. Flat, no nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    TrackCreated {
        id: Ulid,
        name: Option<String>,
    },
    TrackDeleted {
        id: Ulid,
    },
    SlotAdded {
        track_id: Ulid,
        slot: AvailabilitySlot,
    },
    SlotRemoved {
        track_id: Ulid,
        index: usize,
    },
    HoursReplaced {
        track_id: Ulid,
        slots: Vec<AvailabilitySlot>,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub id: Ulid,
    pub name: Option<String>,
    pub hours: Vec<AvailabilitySlot>,
}

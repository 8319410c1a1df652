use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{Result, TrackerError};

/// Longest title accepted on construction, counted in characters.
pub const MAX_TITLE_CHARS: usize = 38;

/// Day of week in the domain numbering: Monday = 1 through Sunday = 7.
///
/// Serialized as its numeric value so a schedule round-trips through storage
/// as a set of small integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Mon = 1,
    Tue = 2,
    Wed = 3,
    Thu = 4,
    Fri = 5,
    Sat = 6,
    Sun = 7,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(value: u8) -> Option<Self> {
        match value {
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            7 => Some(Weekday::Sun),
            _ => None,
        }
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Weekday::from_number(value)
            .ok_or_else(|| serde::de::Error::custom(format!("weekday out of range: {value}")))
    }
}

/// RGB color. Persists as `#RRGGBB` with uppercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl TrackerColor {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn to_hex_string(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }

    pub fn from_hex_string(input: &str) -> Result<Self> {
        let digits = input.strip_prefix('#').ok_or_else(|| {
            TrackerError::Validation(format!("color `{input}` is missing the leading `#`"))
        })?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TrackerError::Validation(format!(
                "color `{input}` is not a #RRGGBB value"
            )));
        }
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| TrackerError::Validation(format!("color `{input}` is not hex")))?;
        Ok(Self {
            red: (value >> 16) as u8,
            green: ((value >> 8) & 0xFF) as u8,
            blue: (value & 0xFF) as u8,
        })
    }
}

impl fmt::Display for TrackerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl Serialize for TrackerColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for TrackerColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TrackerColor::from_hex_string(&raw).map_err(serde::de::Error::custom)
    }
}

/// A trackable habit (non-empty schedule) or one-off event (empty schedule).
///
/// An empty schedule is the distinguished "irregular" state: the tracker is
/// due exactly once, on its creation day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracker {
    pub id: Uuid,
    pub title: String,
    pub color: TrackerColor,
    pub emoji: String,
    pub schedule: BTreeSet<Weekday>,
    pub category_name: String,
    pub created_at: NaiveDate,
    pub is_pinned: bool,
}

impl Tracker {
    pub fn new(
        title: impl Into<String>,
        color: TrackerColor,
        emoji: impl Into<String>,
        schedule: BTreeSet<Weekday>,
        category_name: impl Into<String>,
        created_at: NaiveDate,
    ) -> Result<Self> {
        let title = title.into();
        validate_title(&title)?;
        let category_name = category_name.into();
        if category_name.trim().is_empty() {
            return Err(TrackerError::Validation(
                "a tracker must name its category".into(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            color,
            emoji: emoji.into(),
            schedule,
            category_name,
            created_at,
            is_pinned: false,
        })
    }

    pub fn is_irregular(&self) -> bool {
        self.schedule.is_empty()
    }
}

pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(TrackerError::Validation("title must not be empty".into()));
    }
    let chars = title.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(TrackerError::Validation(format!(
            "title is {chars} characters, limit is {MAX_TITLE_CHARS}"
        )));
    }
    Ok(())
}

impl PartialEq for Tracker {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tracker {}

impl Hash for Tracker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

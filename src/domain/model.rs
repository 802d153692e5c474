use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Known channels for the run: display name -> channel id, plus an optional
/// channel id -> homepage table. BTreeMap keeps document order deterministic.
#[derive(Debug, Clone, Default)]
pub struct ChannelLineup {
    names: BTreeMap<String, String>,
    ids: BTreeSet<String>,
    urls: BTreeMap<String, String>,
}

impl ChannelLineup {
    pub fn new(names: BTreeMap<String, String>, urls: BTreeMap<String, String>) -> Self {
        let ids = names.values().cloned().collect();
        Self { names, ids, urls }
    }

    /// Channels in display-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(name, id)| (name.as_str(), id.as_str()))
    }

    pub fn contains_id(&self, channel_id: &str) -> bool {
        self.ids.contains(channel_id)
    }

    pub fn url_for(&self, channel_id: &str) -> Option<&str> {
        self.urls.get(channel_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One normalized broadcast slot, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammeRecord {
    pub channel_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub description: String,
}

/// Why one airing was dropped instead of becoming a programme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingChannel,
    MissingStart,
    MissingEnd,
    UnparseableStart(String),
    UnparseableEnd(String),
    StartNotBeforeEnd,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingChannel => write!(f, "no channel reference"),
            SkipReason::MissingStart => write!(f, "no start timestamp"),
            SkipReason::MissingEnd => write!(f, "no end timestamp"),
            SkipReason::UnparseableStart(raw) => {
                write!(f, "unparseable start timestamp '{}'", raw)
            }
            SkipReason::UnparseableEnd(raw) => write!(f, "unparseable end timestamp '{}'", raw),
            SkipReason::StartNotBeforeEnd => write!(f, "start is not before end"),
        }
    }
}

/// Per-airing extraction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiringOutcome {
    Programme(ProgrammeRecord),
    Skip(SkipReason),
}

/// Programmes retained for serialization plus the skip accounting reported
/// in the run summary.
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub programmes: Vec<ProgrammeRecord>,
    pub skipped: usize,
    pub unmatched: usize,
}

/// How the query window is derived from the wall clock at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPolicy {
    /// When set, the window starts at today's date at this UTC hour;
    /// otherwise it starts at the current second.
    pub anchor_hour_utc: Option<u32>,
    pub duration_hours: u32,
}

/// A concrete [start, end) query window in UTC, whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WindowPolicy {
    pub fn resolve(&self, now: DateTime<Utc>) -> TimeWindow {
        let start = match self.anchor_hour_utc {
            // out-of-range anchor hours are rejected by config validation
            Some(hour) => now
                .date_naive()
                .and_hms_opt(hour, 0, 0)
                .map(|t| t.and_utc())
                .unwrap_or_else(|| now.trunc_subsecs(0)),
            None => now.trunc_subsecs(0),
        };
        TimeWindow {
            start,
            end: start + Duration::hours(i64::from(self.duration_hours)),
        }
    }
}

/// JSON field names for the upstream payload. The upstream has been seen
/// with more than one shape, so every name can be overridden in
/// [extract.fields]; the defaults match the pldt-cignal-web responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub entries: String,
    pub airings: String,
    pub channel: String,
    pub start: String,
    pub end: String,
    pub programme: String,
    pub titles: String,
    pub descriptions: String,
    pub text: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            entries: "data".to_string(),
            airings: "airing".to_string(),
            channel: "cid".to_string(),
            start: "sc_st_dt".to_string(),
            end: "sc_ed_dt".to_string(),
            programme: "pgm".to_string(),
            titles: "lod".to_string(),
            descriptions: "lon".to_string(),
            text: "n".to_string(),
        }
    }
}

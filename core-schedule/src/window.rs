//! Display windows and their state on a given day.

use crate::date_parser::parse_date;
use chrono::NaiveDate;
use core_metadata::MetadataMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const START_DATE_KEY: &str = "STARTDATE";
pub const END_DATE_KEY: &str = "ENDDATE";

const FILENAME_WINDOW_PATTERN: &str =
    r"(\d{1,2}[-._]\d{1,2}[-._]\d{2,4})(?:@(\d{1,2}[-._]\d{1,2}[-._]\d{2,4}))?";

fn filename_window_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(FILENAME_WINDOW_PATTERN).ok())
        .as_ref()
}

/// How a window with a start date but no end date is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOnlyPolicy {
    /// Shown from the start date onwards
    #[default]
    ActiveFromStart,
    /// Never shown; a start date alone carries no usable signal
    NeverActive,
}

/// Where a file stands relative to its window on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    Active,
    /// Start date still ahead
    Upcoming,
    /// End date already passed
    Expired,
    /// No usable dates at all
    NoSignal,
}

impl WindowState {
    pub fn is_active(self) -> bool {
        self == WindowState::Active
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindowState::Active => "active",
            WindowState::Upcoming => "upcoming",
            WindowState::Expired => "expired",
            WindowState::NoSignal => "no_signal",
        }
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A display window; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Extract a window from a filename stem.
    ///
    /// `..._03_03_2022` yields an end date only; `..._01.03.22@15.03.22`
    /// yields start and end. Returns `None` when the stem has no date-like
    /// token or none of its tokens parse, so the caller can fall back to
    /// metadata.
    pub fn from_filename(stem: &str) -> Option<Self> {
        let captures = filename_window_regex()?.captures(stem)?;
        let first = captures.get(1).map(|m| m.as_str());
        let second = captures.get(2).map(|m| m.as_str());

        let window = match (first, second) {
            (Some(start), Some(end)) => Self::new(parse_date(start), parse_date(end)),
            (Some(end), None) => Self::new(None, parse_date(end)),
            _ => return None,
        };

        if window.is_unbounded() {
            debug!(stem, "Date-like filename token did not parse, falling back to metadata");
            return None;
        }
        Some(window)
    }

    /// Build a window from `STARTDATE` / `ENDDATE` metadata entries.
    pub fn from_metadata(map: &MetadataMap) -> Self {
        Self::new(
            metadata_date(map, START_DATE_KEY),
            metadata_date(map, END_DATE_KEY),
        )
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A start after the end can never be active.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start > end)
    }

    /// State of the window on `today`. Both bounds are inclusive.
    pub fn state_on(&self, today: NaiveDate, start_only: StartOnlyPolicy) -> WindowState {
        match (self.start, self.end) {
            (None, None) => WindowState::NoSignal,
            (None, Some(end)) => {
                if today <= end {
                    WindowState::Active
                } else {
                    WindowState::Expired
                }
            }
            (Some(start), None) => match start_only {
                StartOnlyPolicy::ActiveFromStart if today >= start => WindowState::Active,
                StartOnlyPolicy::ActiveFromStart => WindowState::Upcoming,
                StartOnlyPolicy::NeverActive => WindowState::NoSignal,
            },
            (Some(start), Some(end)) => {
                if start > end {
                    warn!(%start, %end, "Date window starts after it ends");
                }
                if today > end {
                    WindowState::Expired
                } else if today < start {
                    WindowState::Upcoming
                } else {
                    WindowState::Active
                }
            }
        }
    }
}

fn metadata_date(map: &MetadataMap, key: &str) -> Option<NaiveDate> {
    let Some(raw) = map.get(key) else {
        debug!(key, "Metadata key not present");
        return None;
    };
    let parsed = parse_date(raw);
    if parsed.is_none() {
        debug!(key, value = %raw, "Metadata date not recognised");
    }
    parsed
}

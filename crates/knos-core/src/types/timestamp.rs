// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::SubsecRound;
use chrono::TimeDelta;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Naive formats accepted when reading timestamps back. Covers what we
/// write ourselves and what other tools tend to write by hand.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A local timestamp without a timezone and millisecond precision.
///
/// [`Timestamp::MIN`] stands in for "unknown": it sorts before every real
/// moment, so an entry with a garbled date is always treated as overdue.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub const MIN: Timestamp = Timestamp(NaiveDateTime::MIN);

    pub fn new(ndt: NaiveDateTime) -> Self {
        Self(ndt.trunc_subsecs(3))
    }

    /// Converts a timestamp into a `NaiveDateTime`.
    pub fn into_inner(self) -> NaiveDateTime {
        self.0
    }

    /// The current timestamp in the user's local time.
    #[cfg(feature = "clock")]
    pub fn now() -> Self {
        Self(chrono::Local::now().naive_local().trunc_subsecs(3))
    }

    pub fn is_min(self) -> bool {
        self == Self::MIN
    }

    /// Parse an ISO-8601 string without ever failing.
    ///
    /// Timezone-aware strings are converted to local time and stripped of
    /// their offset. Empty or malformed strings yield [`Timestamp::MIN`].
    pub fn parse_lenient(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Self::MIN;
        }
        if let Some(aware) = parse_aware(s) {
            return Self::new(to_local(aware));
        }
        for format in NAIVE_FORMATS {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
                return Self::new(ndt);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Self::new(date.and_time(chrono::NaiveTime::MIN));
        }
        Self::MIN
    }

    /// This timestamp shifted forward by `delta`, saturating at the
    /// representable maximum.
    pub fn plus(self, delta: TimeDelta) -> Self {
        match self.0.checked_add_signed(delta) {
            Some(ndt) => Self(ndt),
            None => Self(NaiveDateTime::MAX),
        }
    }

    /// The signed time elapsed from `earlier` to `self`.
    pub fn since(self, earlier: Timestamp) -> TimeDelta {
        self.0.signed_duration_since(earlier.0)
    }

    /// The `YYYY-MM-DD` date component, or `None` for [`Timestamp::MIN`].
    pub fn date_string(self) -> Option<String> {
        if self.is_min() {
            None
        } else {
            Some(self.0.format("%Y-%m-%d").to_string())
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::MIN
    }
}

fn parse_aware(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    // RFC 3339 insists on seconds; minute-precision offsets are common too.
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z").ok()
}

#[cfg(feature = "clock")]
fn to_local(dt: DateTime<FixedOffset>) -> NaiveDateTime {
    dt.with_timezone(&chrono::Local).naive_local()
}

#[cfg(not(feature = "clock"))]
fn to_local(dt: DateTime<FixedOffset>) -> NaiveDateTime {
    dt.naive_utc()
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> String {
        if ts.is_min() {
            String::new()
        } else {
            ts.to_string()
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from(*self))
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => Timestamp::parse_lenient(&s),
            _ => Timestamp::MIN,
        })
    }
}

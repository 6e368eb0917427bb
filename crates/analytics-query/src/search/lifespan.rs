//! Lifespan policies for result stores and their search processes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::{QueryError, Result};

/// Why a client asks for a store to go away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DestroyReason {
    Manual,
    /// A newer search replaced this one in the same UI slot.
    NoLongerNeeded,
    TabClose,
    WindowClose,
}

impl DestroyReason {
    /// Reasons that remove a store regardless of its lifespan.
    pub fn is_unconditional(self) -> bool {
        matches!(self, Self::Manual | Self::NoLongerNeeded)
    }
}

/// Runtime lifespan with parsed durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lifespan {
    pub time_to_idle: Option<Duration>,
    pub time_to_live: Option<Duration>,
    pub destroy_on_tab_close: bool,
    pub destroy_on_window_close: bool,
}

impl Lifespan {
    /// Whether `reason` permits destruction under this policy.
    pub fn allows(&self, reason: DestroyReason) -> bool {
        match reason {
            DestroyReason::Manual | DestroyReason::NoLongerNeeded => true,
            DestroyReason::TabClose => self.destroy_on_tab_close,
            DestroyReason::WindowClose => self.destroy_on_window_close,
        }
    }

    /// True once `age` passed the time to live or `idle` the time to idle.
    pub fn is_expired(&self, age: Duration, idle: Duration) -> bool {
        self.time_to_live.is_some_and(|ttl| age >= ttl)
            || self.time_to_idle.is_some_and(|tti| idle >= tti)
    }

    pub fn to_info(&self) -> LifespanInfo {
        LifespanInfo {
            time_to_idle: self.time_to_idle.map(format_duration),
            time_to_live: self.time_to_live.map(format_duration),
            destroy_on_tab_close: self.destroy_on_tab_close,
            destroy_on_window_close: self.destroy_on_window_close,
        }
    }
}

/// Wire form of a lifespan. Durations are strings such as `10m` or `500ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LifespanInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_idle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<String>,
    pub destroy_on_tab_close: bool,
    pub destroy_on_window_close: bool,
}

impl Default for LifespanInfo {
    fn default() -> Self {
        Self {
            time_to_idle: None,
            time_to_live: None,
            destroy_on_tab_close: true,
            destroy_on_window_close: true,
        }
    }
}

impl LifespanInfo {
    pub fn to_lifespan(&self) -> Result<Lifespan> {
        Ok(Lifespan {
            time_to_idle: self.time_to_idle.as_deref().map(parse_duration).transpose()?,
            time_to_live: self.time_to_live.as_deref().map(parse_duration).transpose()?,
            destroy_on_tab_close: self.destroy_on_tab_close,
            destroy_on_window_close: self.destroy_on_window_close,
        })
    }
}

/// Both lifespans of a result store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResultStoreSettings {
    pub search_process_lifespan: LifespanInfo,
    pub store_lifespan: LifespanInfo,
}

impl ResultStoreSettings {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            search_process_lifespan: config.search_process_lifespan.clone(),
            store_lifespan: config.store_lifespan.clone(),
        }
    }

    pub(crate) fn parse(&self) -> Result<(Lifespan, Lifespan)> {
        Ok((
            self.search_process_lifespan.to_lifespan()?,
            self.store_lifespan.to_lifespan()?,
        ))
    }
}

const UNITS: [(&str, u64); 5] = [
    ("d", 86_400_000),
    ("h", 3_600_000),
    ("m", 60_000),
    ("s", 1_000),
    ("ms", 1),
];

/// Parses `<number><unit>` where unit is one of `ms`, `s`, `m`, `h`, `d`.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let invalid = || QueryError::InvalidRequest(format!("invalid duration '{text}'"));
    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (number, unit) = trimmed.split_at(split);
    let number: u64 = number.parse().map_err(|_| invalid())?;
    let millis_per_unit = UNITS
        .iter()
        .find(|(name, _)| *name == unit.trim())
        .map(|(_, millis)| *millis)
        .ok_or_else(invalid)?;
    let millis = number.checked_mul(millis_per_unit).ok_or_else(invalid)?;
    Ok(Duration::from_millis(millis))
}

/// Formats a duration with the largest unit that divides it exactly.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis().min(u128::from(u64::MAX)) as u64;
    for (name, unit) in UNITS {
        if millis > 0 && millis % unit == 0 {
            return format!("{}{}", millis / unit, name);
        }
    }
    format!("{millis}ms")
}

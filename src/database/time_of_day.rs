//! Clock-time-of-day storage, isolating the rest of the crate from a
//! Postgres driver quirk: some drivers hand back a `TIME` column as
//! `1970-01-01THH:MM:SSZ`
//! rather than a bare `HH:MM:SS`. `TimeOfDay` normalizes both shapes on the
//! way in and always renders `HH:MM:SS` on the way out, so every layer above
//! this module only ever sees `HH:MM`.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn from_naive(time: NaiveTime) -> Self {
        Self(time)
    }

    pub fn into_naive(self) -> NaiveTime {
        self.0
    }

    /// Parses either `HH:MM`, `HH:MM:SS`, or an RFC3339 timestamp-at-epoch
    /// (`1970-01-01THH:MM:SSZ`) and extracts the time-of-day component.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if let Ok(t) = NaiveTime::parse_from_str(raw, "%H:%M:%S") {
            return Ok(Self(t));
        }
        if let Ok(t) = NaiveTime::parse_from_str(raw, "%H:%M") {
            return Ok(Self(t));
        }
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Ok(Self(dt.time()));
        }
        Err(format!("invalid time-of-day value: {raw}"))
    }

    /// Renders as `HH:MM`, the only shape the HTTP edge exposes.
    pub fn to_hh_mm(self) -> String {
        self.0.format("%H:%M").to_string()
    }

    /// Renders as `HH:MM:SS`, the shape written back to the database.
    pub fn to_hh_mm_ss(self) -> String {
        self.0.format("%H:%M:%S").to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hh_mm())
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hh_mm())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        TimeOfDay::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl sqlx::Type<sqlx::Postgres> for TimeOfDay {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <NaiveTime as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for TimeOfDay {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <NaiveTime as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TimeOfDay {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        // The driver may hand back a TIME column already decoded as a
        // NaiveTime (the common case) or, depending on the wire format
        // negotiated, as text; fall back to string parsing so both work.
        if let Ok(t) = <NaiveTime as sqlx::Decode<sqlx::Postgres>>::decode(value) {
            return Ok(Self(t));
        }
        let raw = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        TimeOfDay::parse(&raw).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hh_mm() {
        assert_eq!(TimeOfDay::parse("09:30").unwrap().to_hh_mm(), "09:30");
    }

    #[test]
    fn parses_hh_mm_ss() {
        assert_eq!(TimeOfDay::parse("09:30:15").unwrap().to_hh_mm(), "09:30");
    }

    #[test]
    fn parses_epoch_timestamp_quirk() {
        let t = TimeOfDay::parse("1970-01-01T17:00:00Z").unwrap();
        assert_eq!(t.to_hh_mm(), "17:00");
        assert_eq!(t.to_hh_mm_ss(), "17:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(TimeOfDay::parse("not-a-time").is_err());
    }

    #[test]
    fn orders_chronologically() {
        let start = TimeOfDay::parse("09:00").unwrap();
        let end = TimeOfDay::parse("17:00").unwrap();
        assert!(start < end);
    }
}

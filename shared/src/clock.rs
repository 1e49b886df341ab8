use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Single source of "now" and of the target timezone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn timezone(&self) -> Tz;

    fn local_now(&self) -> DateTime<Tz> {
        self.to_local(self.now())
    }

    fn to_local(&self, timestamp: DateTime<Utc>) -> DateTime<Tz> {
        timestamp.with_timezone(&self.timezone())
    }

    /// Calendar date of "now" in the configured timezone.
    fn today(&self) -> NaiveDate {
        self.local_now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub const fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    timezone: Tz,
}

impl FixedClock {
    pub const fn new(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self { now, timezone }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

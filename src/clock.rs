use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Time source of the engine. Injected so event timestamps can be pinned in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// RFC 3339 rendering of [`now`](Clock::now).
    fn to_iso_string(&self) -> String {
        let now = self.now();
        now.format(&Rfc3339)
            .unwrap_or_else(|_| now.unix_timestamp().to_string())
    }
}

/// Wall clock, UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that never moves.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_renders_rfc3339() {
        let clock = FixedClock(OffsetDateTime::UNIX_EPOCH);
        assert_eq!(clock.to_iso_string(), "1970-01-01T00:00:00Z");
    }
}

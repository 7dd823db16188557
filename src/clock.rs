use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

/// Fixed-offset wall clock. Every date and time that ends up in a QR token,
/// an attendance row or a backup file name comes from here, so the whole
/// service shares one timezone regardless of where it is deployed.
#[derive(Clone, Copy)]
pub struct Clock {
    offset: FixedOffset,
}

impl Clock {
    pub fn from_offset_minutes(minutes: i32) -> Self {
        let offset =
            FixedOffset::east_opt(minutes * 60).expect("TZ_OFFSET_MINUTES out of range");
        Self { offset }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn now_time(&self) -> NaiveTime {
        self.now().time()
    }

    pub fn timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_shifts_wall_clock() {
        let utc = Clock::from_offset_minutes(0);
        let ist = Clock::from_offset_minutes(330);
        // two separate now() calls, so allow a second of skew
        let delta = ist.now().naive_local() - utc.now().naive_local();
        assert!((delta.num_seconds() - 330 * 60).abs() <= 1);
    }

    #[test]
    fn timestamp_is_offset_independent() {
        let utc = Clock::from_offset_minutes(0);
        let ist = Clock::from_offset_minutes(330);
        assert!((utc.timestamp() - ist.timestamp()).abs() <= 1);
    }
}

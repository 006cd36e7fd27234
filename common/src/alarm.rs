use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Token some RTC drivers use for this alarm even though it fires once a day.
pub const LEGACY_HOURLY_TOKEN: &str = "hourly";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
}

impl Recurrence {
    /// `"hourly"` is accepted and maps to [`Recurrence::Daily`]; the recompute
    /// only has to happen when the date rolls over.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("daily") || token.eq_ignore_ascii_case(LEGACY_HOURLY_TOKEN) {
            Some(Self::Daily)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSchedule {
    pub time_of_day: NaiveTime,
    pub recurrence: Recurrence,
}

impl AlarmSchedule {
    pub fn daily(time_of_day: NaiveTime) -> Self {
        Self {
            time_of_day,
            recurrence: Recurrence::Daily,
        }
    }

    /// First trigger strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self.recurrence {
            Recurrence::Daily => {
                let today = now.date().and_time(self.time_of_day);
                if today > now {
                    today
                } else {
                    today + Duration::days(1)
                }
            }
        }
    }
}

/// Software model of an RTC alarm register: a pending flag that is raised when
/// the trigger time passes and cleared when read.
#[derive(Debug, Clone, Default)]
pub struct AlarmLatch {
    schedule: Option<AlarmSchedule>,
    next_fire: Option<NaiveDateTime>,
    pending: bool,
}

impl AlarmLatch {
    pub fn arm(&mut self, schedule: AlarmSchedule, now: NaiveDateTime) {
        self.schedule = Some(schedule);
        self.next_fire = Some(schedule.next_after(now));
        self.pending = false;
    }

    /// Recalculates the next trigger after the clock was set. A pending
    /// firing is kept.
    pub fn rearm(&mut self, now: NaiveDateTime) {
        if let Some(schedule) = self.schedule {
            self.next_fire = Some(schedule.next_after(now));
        }
    }

    /// Raises the flag if the trigger time has passed. Several missed triggers
    /// collapse into one firing.
    pub fn observe(&mut self, now: NaiveDateTime) {
        let (Some(schedule), Some(next)) = (self.schedule, self.next_fire) else {
            return;
        };

        if now >= next {
            self.pending = true;
            self.next_fire = Some(schedule.next_after(now));
        }
    }

    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn poll(&mut self, now: NaiveDateTime) -> bool {
        self.observe(now);
        self.take()
    }

    pub fn next_fire(&self) -> Option<NaiveDateTime> {
        self.next_fire
    }
}

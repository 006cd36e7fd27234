use chrono::NaiveDateTime;

use crate::{alarm::AlarmSchedule, calendar::CurrentTime, error::HardwareError};

/// Real-time clock with one recurring alarm.
pub trait ClockStore {
    fn now(&mut self) -> Result<CurrentTime, HardwareError>;

    /// Seeds the clock, normally once at boot from the time service.
    fn set_now(&mut self, time: CurrentTime) -> Result<(), HardwareError>;

    fn schedule_alarm(&mut self, schedule: AlarmSchedule) -> Result<(), HardwareError>;

    /// Reads and clears the pending-alarm flag: one `true` per trigger.
    fn alarm_fired(&mut self) -> Result<bool, HardwareError>;

    fn next_alarm(&self) -> Option<NaiveDateTime> {
        None
    }
}

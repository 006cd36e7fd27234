use chrono::{Local, NaiveDateTime, TimeDelta};

use countdown_common::{AlarmLatch, AlarmSchedule, ClockStore, CurrentTime, HardwareError};

type TimeSource = Box<dyn Fn() -> NaiveDateTime + Send>;

/// Host stand-in for the battery-backed RTC: the system clock plus an offset
/// captured when the clock is seeded.
pub struct SystemRtc {
    source: TimeSource,
    offset: TimeDelta,
    alarm: AlarmLatch,
}

impl SystemRtc {
    pub fn new() -> Self {
        Self::with_source(Box::new(|| Local::now().naive_local()))
    }

    pub fn with_source(source: TimeSource) -> Self {
        Self {
            source,
            offset: TimeDelta::zero(),
            alarm: AlarmLatch::default(),
        }
    }

    fn read(&self) -> Result<NaiveDateTime, HardwareError> {
        (self.source)()
            .checked_add_signed(self.offset)
            .ok_or_else(|| HardwareError::Clock("clock reading out of range".to_string()))
    }
}

impl Default for SystemRtc {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockStore for SystemRtc {
    fn now(&mut self) -> Result<CurrentTime, HardwareError> {
        self.read().map(CurrentTime::new)
    }

    fn set_now(&mut self, time: CurrentTime) -> Result<(), HardwareError> {
        self.offset = time.as_naive() - (self.source)();
        let now = self.read()?;
        self.alarm.rearm(now);
        Ok(())
    }

    fn schedule_alarm(&mut self, schedule: AlarmSchedule) -> Result<(), HardwareError> {
        let now = self.read()?;
        self.alarm.arm(schedule, now);
        Ok(())
    }

    fn alarm_fired(&mut self) -> Result<bool, HardwareError> {
        let now = self.read()?;
        Ok(self.alarm.poll(now))
    }

    fn next_alarm(&self) -> Option<NaiveDateTime> {
        self.alarm.next_fire()
    }
}

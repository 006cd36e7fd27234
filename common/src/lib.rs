pub mod alarm;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod display;
pub mod error;
pub mod form;
pub mod page;
pub mod time_source;
pub mod types;

pub use alarm::{AlarmLatch, AlarmSchedule, Recurrence};
pub use calendar::{CurrentTime, TargetDate};
pub use clock::ClockStore;
pub use config::{DisplayConfig, RuntimeConfig, TimeServiceConfig};
pub use countdown::days_remaining;
pub use display::{
    heartbeat_for_second, render, show_frame, Digits, DisplayState, Glyph, SegmentDisplay,
    DIGIT_COUNT,
};
pub use error::{CountdownError, ErrorDisposition, HardwareError, NetworkError, ValidationError};
pub use form::{FormSubmission, FormVariant};
pub use page::{render_page, Banner, Prefill};
pub use time_source::{parse_time_payload, TimeFormat};
pub use types::CountdownStatus;

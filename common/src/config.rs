use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    alarm::{AlarmSchedule, Recurrence, LEGACY_HOURLY_TOKEN},
    calendar::TargetDate,
    form::FormVariant,
    time_source::{endpoint_url, TimeFormat, DEFAULT_TIME_SERVICE_BASE},
};

pub const ENV_AIO_USERNAME: &str = "AIO_USERNAME";
pub const ENV_AIO_KEY: &str = "AIO_KEY";
pub const ENV_TIMEZONE: &str = "TIMEZONE";
pub const ENV_TIME_URL: &str = "COUNTDOWN_TIME_URL";
pub const ENV_TIME_FORMAT: &str = "COUNTDOWN_TIME_FORMAT";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "COUNTDOWN_FETCH_TIMEOUT_SECS";
pub const ENV_FETCH_ATTEMPTS: &str = "COUNTDOWN_FETCH_ATTEMPTS";
pub const ENV_FORM_VARIANT: &str = "COUNTDOWN_FORM_VARIANT";
pub const ENV_TARGET: &str = "COUNTDOWN_TARGET";
pub const ENV_HTTP_PORT: &str = "COUNTDOWN_HTTP_PORT";
pub const ENV_POLL_MS: &str = "COUNTDOWN_POLL_MS";
pub const ENV_BRIGHTNESS: &str = "COUNTDOWN_BRIGHTNESS";
pub const ENV_ALARM: &str = "COUNTDOWN_ALARM";
pub const ENV_ALARM_RECURRENCE: &str = "COUNTDOWN_ALARM_RECURRENCE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeServiceConfig {
    pub username: String,
    pub key: String,
    /// Full endpoint URL; replaces the one built from the account.
    pub url_override: Option<String>,
    pub format: TimeFormat,
    pub timeout_secs: u64,
    pub attempts: u32,
}

impl Default for TimeServiceConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            key: String::new(),
            url_override: None,
            format: TimeFormat::Struct,
            timeout_secs: 10,
            attempts: 5,
        }
    }
}

impl TimeServiceConfig {
    pub fn endpoint(&self) -> String {
        match &self.url_override {
            Some(url) => url.clone(),
            None => endpoint_url(
                DEFAULT_TIME_SERVICE_BASE,
                &self.username,
                &self.key,
                self.format,
            ),
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.key.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub brightness: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { brightness: 0.2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub time_service: TimeServiceConfig,
    pub display: DisplayConfig,
    pub form_variant: FormVariant,
    pub default_target: TargetDate,
    pub alarm: AlarmSchedule,
    /// Informational only; countdown arithmetic ignores it.
    pub timezone: String,
    pub http_port: u16,
    pub poll_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            time_service: TimeServiceConfig::default(),
            display: DisplayConfig::default(),
            form_variant: FormVariant::Split,
            default_target: default_target(),
            alarm: AlarmSchedule::daily(default_alarm_time()),
            timezone: "UTC".to_string(),
            http_port: 8080,
            poll_interval_ms: 50,
        }
    }
}

fn default_target() -> TargetDate {
    TargetDate::from(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap_or(NaiveDate::MIN))
}

/// One second past midnight, so the recompute sees the new date.
fn default_alarm_time() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 1).unwrap_or_default()
}

impl RuntimeConfig {
    /// Applies overrides from a variable lookup (normally the process
    /// environment). Values that do not parse are skipped and reported.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(value) = lookup(ENV_AIO_USERNAME) {
            self.time_service.username = value;
        }
        if let Some(value) = lookup(ENV_AIO_KEY) {
            self.time_service.key = value;
        }
        if let Some(value) = lookup(ENV_TIMEZONE) {
            self.timezone = value;
        }
        if let Some(value) = lookup(ENV_TIME_URL) {
            let value = value.trim().to_string();
            self.time_service.url_override = (!value.is_empty()).then_some(value);
        }

        override_with(&lookup, ENV_TIME_FORMAT, &mut warnings, |value| {
            self.time_service.format = TimeFormat::from_token(value)?;
            Some(())
        });
        override_with(&lookup, ENV_FETCH_TIMEOUT_SECS, &mut warnings, |value| {
            self.time_service.timeout_secs = value.trim().parse().ok()?;
            Some(())
        });
        override_with(&lookup, ENV_FETCH_ATTEMPTS, &mut warnings, |value| {
            self.time_service.attempts = value.trim().parse().ok()?;
            Some(())
        });
        override_with(&lookup, ENV_FORM_VARIANT, &mut warnings, |value| {
            self.form_variant = FormVariant::from_token(value)?;
            Some(())
        });
        override_with(&lookup, ENV_TARGET, &mut warnings, |value| {
            self.default_target = TargetDate::parse_iso(value).ok()?;
            Some(())
        });
        override_with(&lookup, ENV_HTTP_PORT, &mut warnings, |value| {
            self.http_port = value.trim().parse().ok()?;
            Some(())
        });
        override_with(&lookup, ENV_POLL_MS, &mut warnings, |value| {
            self.poll_interval_ms = value.trim().parse().ok()?;
            Some(())
        });
        override_with(&lookup, ENV_BRIGHTNESS, &mut warnings, |value| {
            self.display.brightness = value.trim().parse().ok()?;
            Some(())
        });
        override_with(&lookup, ENV_ALARM, &mut warnings, |value| {
            self.alarm.time_of_day = NaiveTime::parse_from_str(value.trim(), "%H:%M:%S").ok()?;
            Some(())
        });
        override_with(&lookup, ENV_ALARM_RECURRENCE, &mut warnings, |value| {
            self.alarm.recurrence = Recurrence::from_token(value)?;
            Some(())
        });
        if let Some(value) = lookup(ENV_ALARM_RECURRENCE)
            .filter(|value| value.trim().eq_ignore_ascii_case(LEGACY_HOURLY_TOKEN))
        {
            warnings.push(format!(
                "{ENV_ALARM_RECURRENCE}={value:?} is treated as a daily alarm"
            ));
        }

        warnings
    }

    pub fn sanitize(&mut self) {
        self.display.brightness = if self.display.brightness.is_finite() {
            self.display.brightness.clamp(0.0, 1.0)
        } else {
            DisplayConfig::default().brightness
        };
        self.poll_interval_ms = self.poll_interval_ms.clamp(1, 1_000);
        self.time_service.timeout_secs = self.time_service.timeout_secs.clamp(1, 120);
        self.time_service.attempts = self.time_service.attempts.clamp(1, 20);
        if self.http_port == 0 {
            self.http_port = 8080;
        }
        if self.timezone.trim().is_empty() {
            self.timezone = "UTC".to_string();
        }
    }

    pub fn timezone_is_known(&self) -> bool {
        self.timezone.parse::<Tz>().is_ok()
    }
}

fn override_with<L, A>(lookup: &L, name: &str, warnings: &mut Vec<String>, apply: A)
where
    L: Fn(&str) -> Option<String>,
    A: FnOnce(&str) -> Option<()>,
{
    let Some(value) = lookup(name) else {
        return;
    };

    if apply(&value).is_none() {
        warnings.push(format!("ignoring invalid {name}={value:?}"));
    }
}

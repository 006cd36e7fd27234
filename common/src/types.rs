use serde::Serialize;

use crate::form::FormVariant;

#[derive(Debug, Clone, Serialize)]
pub struct CountdownStatus {
    #[serde(rename = "targetDate")]
    pub target_date: String,
    #[serde(rename = "daysRemaining")]
    pub days_remaining: Option<i64>,
    #[serde(rename = "lastSubmitted")]
    pub last_submitted: Option<i64>,
    pub display: String,
    pub heartbeat: bool,
    #[serde(rename = "formVariant")]
    pub form_variant: FormVariant,
    #[serde(rename = "timeSynced")]
    pub time_synced: bool,
    pub now: Option<String>,
    #[serde(rename = "nextAlarm")]
    pub next_alarm: Option<String>,
    pub timezone: String,
}

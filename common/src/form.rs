use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{calendar::TargetDate, error::ValidationError};

pub const FIELD_YEAR: &str = "fyear";
pub const FIELD_MONTH: &str = "fmonth";
pub const FIELD_DAY: &str = "fday";
pub const FIELD_DATE: &str = "fdate";

/// Which form the device serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormVariant {
    /// Separate year, month and day inputs.
    #[default]
    Split,
    /// One `YYYY-MM-DD` input.
    Iso,
}

impl FormVariant {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "split" => Some(Self::Split),
            "iso" => Some(Self::Iso),
            _ => None,
        }
    }
}

/// Raw strings as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSubmission {
    Split {
        year: String,
        month: String,
        day: String,
    },
    Iso {
        date: String,
    },
}

impl FormSubmission {
    /// Picks the submission shape from the posted field names. `fdate` wins
    /// when both shapes are present.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (Cow<'a, str>, Cow<'a, str>)>,
    {
        let mut year = None;
        let mut month = None;
        let mut day = None;
        let mut date = None;

        for (name, value) in fields {
            let slot = match name.trim() {
                FIELD_YEAR => &mut year,
                FIELD_MONTH => &mut month,
                FIELD_DAY => &mut day,
                FIELD_DATE => &mut date,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }

        if let Some(date) = date {
            return Ok(Self::Iso { date });
        }

        match (year, month, day) {
            (Some(year), Some(month), Some(day)) => Ok(Self::Split { year, month, day }),
            (None, None, None) => Err(ValidationError::MissingField(FIELD_DATE)),
            (None, _, _) => Err(ValidationError::MissingField(FIELD_YEAR)),
            (_, None, _) => Err(ValidationError::MissingField(FIELD_MONTH)),
            (_, _, None) => Err(ValidationError::MissingField(FIELD_DAY)),
        }
    }

    /// Decodes a POST body. `text/plain` bodies carry one `name=value` per
    /// line; anything else is treated as URL-encoded.
    pub fn decode(content_type: Option<&str>, body: &[u8]) -> Result<Self, ValidationError> {
        let is_plain = content_type
            .map(|value| value.trim().to_ascii_lowercase().starts_with("text/plain"))
            .unwrap_or(false);

        if !is_plain {
            return Self::from_fields(form_urlencoded::parse(body));
        }

        let text = std::str::from_utf8(body).map_err(|_| ValidationError::NonUtf8Body)?;
        Self::from_fields(text.lines().filter_map(|line| {
            line.trim_end_matches('\r')
                .split_once('=')
                .map(|(name, value)| (Cow::Borrowed(name), Cow::Borrowed(value)))
        }))
    }

    pub fn to_target(&self) -> Result<TargetDate, ValidationError> {
        match self {
            Self::Split { year, month, day } => TargetDate::from_ymd(
                parse_integer(FIELD_YEAR, year)?,
                parse_integer(FIELD_MONTH, month)?,
                parse_integer(FIELD_DAY, day)?,
            ),
            Self::Iso { date } => TargetDate::parse_iso(date),
        }
    }
}

fn parse_integer(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotAnInteger {
            field,
            value: value.to_string(),
        })
}

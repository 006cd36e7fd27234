use tracing::{debug, info};

use countdown_common::{Digits, Glyph, HardwareError, SegmentDisplay, DIGIT_COUNT};

/// Segment display that reports frames through the log. Stands in for the
/// I2C backpack on host builds.
#[derive(Debug, Default)]
pub struct LogDisplay {
    digits: Digits,
    heartbeat: bool,
    brightness: f32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.digits.iter().map(|glyph| glyph.as_char()).collect()
    }
}

impl SegmentDisplay for LogDisplay {
    fn set_brightness(&mut self, level: f32) -> Result<(), HardwareError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(HardwareError::Display(format!(
                "brightness {level} outside 0.0..=1.0"
            )));
        }
        self.brightness = level;
        info!("display brightness set to {level:.2}");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HardwareError> {
        self.digits = [Glyph::Blank; DIGIT_COUNT];
        self.heartbeat = false;
        Ok(())
    }

    fn write_digits(&mut self, digits: &Digits) -> Result<(), HardwareError> {
        self.digits = *digits;
        info!("display [{}] at brightness {:.2}", self.text(), self.brightness);
        Ok(())
    }

    fn set_heartbeat(&mut self, on: bool) -> Result<(), HardwareError> {
        if self.heartbeat != on {
            debug!("heartbeat {}", if on { "on" } else { "off" });
        }
        self.heartbeat = on;
        Ok(())
    }
}

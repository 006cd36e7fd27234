use crate::error::HardwareError;

/// Digit positions on the segment display.
pub const DIGIT_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Glyph {
    #[default]
    Blank,
    Minus,
    Digit(u8),
}

impl Glyph {
    pub fn as_char(self) -> char {
        match self {
            Self::Blank => ' ',
            Self::Minus => '-',
            Self::Digit(d) => char::from(b'0' + d % 10),
        }
    }
}

pub type Digits = [Glyph; DIGIT_COUNT];

/// Everything the display shows. Derived from the countdown and the
/// current second; never a source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayState {
    pub digits: Digits,
    pub heartbeat: bool,
}

impl DisplayState {
    pub fn text(&self) -> String {
        self.digits.iter().map(|glyph| glyph.as_char()).collect()
    }
}

/// Right-aligns `value` in the digit budget. Values too wide keep their
/// least-significant digits; a negative value always keeps its sign.
pub fn render(value: i64, heartbeat: bool) -> DisplayState {
    let negative = value < 0;
    let magnitude = value.unsigned_abs().to_string();
    let budget = if negative { DIGIT_COUNT - 1 } else { DIGIT_COUNT };
    let kept = &magnitude[magnitude.len().saturating_sub(budget)..];

    let mut glyphs = Vec::with_capacity(DIGIT_COUNT);
    if negative {
        glyphs.push(Glyph::Minus);
    }
    glyphs.extend(kept.bytes().map(|b| Glyph::Digit(b - b'0')));

    let mut digits = [Glyph::Blank; DIGIT_COUNT];
    digits[DIGIT_COUNT - glyphs.len()..].copy_from_slice(&glyphs);

    DisplayState { digits, heartbeat }
}

/// Heartbeat dot is lit on even seconds.
pub fn heartbeat_for_second(second: u32) -> bool {
    second % 2 == 0
}

/// Four-digit segment display with one indicator dot.
pub trait SegmentDisplay {
    fn set_brightness(&mut self, level: f32) -> Result<(), HardwareError>;

    /// Blank every digit and the indicator.
    fn clear(&mut self) -> Result<(), HardwareError>;

    fn write_digits(&mut self, digits: &Digits) -> Result<(), HardwareError>;

    fn set_heartbeat(&mut self, on: bool) -> Result<(), HardwareError>;
}

/// Writes a full frame, clearing first so no stale digit survives.
pub fn show_frame<D: SegmentDisplay + ?Sized>(
    display: &mut D,
    state: &DisplayState,
) -> Result<(), HardwareError> {
    display.clear()?;
    display.write_digits(&state.digits)?;
    display.set_heartbeat(state.heartbeat)
}

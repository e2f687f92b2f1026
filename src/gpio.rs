use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    #[inline]
    pub fn is_high(self) -> bool {
        self == PinLevel::High
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }
}

/// A hardware line identifier as understood by the active [`PinDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinLine(pub u8);

impl PinLine {
    /// Returns the underlying line number.
    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }
}

/// Static description of one pin in the map: logical name plus hardware line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinSpec {
    pub name: String,
    pub line: PinLine,
}

impl PinSpec {
    pub fn new(name: impl Into<String>, line: u8) -> Self {
        Self {
            name: name.into(),
            line: PinLine(line),
        }
    }
}

/// Backend giving access to physical (or simulated) GPIO lines.
///
/// `claim` reserves a line for one direction and must fail if the line is
/// absent or held elsewhere. `release` should not fail in practice; errors
/// it does return are logged by the pin bank and otherwise ignored.
pub trait PinDriver: Send {
    fn claim(&mut self, line: PinLine, direction: PinDirection) -> Result<()>;
    fn release(&mut self, line: PinLine) -> Result<()>;
    fn read_input(&mut self, line: PinLine) -> Result<PinLevel>;
    fn set_output(&mut self, line: PinLine, level: PinLevel) -> Result<()>;
}


//! Engine and loop-length parameters.

use core::fmt;
use core::str::FromStr;

/// Which generator the plugin is driving.
///
/// The engine decides how a [`Note`](crate::Note) maps to a MIDI pitch:
/// melodic engines use the note's pitch, the drum engine uses its row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Engine {
    /// 808 bass
    EightOhEight = 0,
    Bass = 1,
    #[default]
    Drums = 2,
}

impl Engine {
    /// All engines in selector order.
    pub const ALL: [Engine; 3] = [Engine::EightOhEight, Engine::Bass, Engine::Drums];

    /// Look up an engine by its selector index.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Engine::EightOhEight),
            1 => Some(Engine::Bass),
            2 => Some(Engine::Drums),
            _ => None,
        }
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// True when notes address drum lanes rather than pitches.
    pub const fn is_drum_mode(self) -> bool {
        matches!(self, Engine::Drums)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Engine::EightOhEight => "808",
            Engine::Bass => "Bass",
            Engine::Drums => "Drums",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned for an unknown engine or bar-count name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseParamError;

impl fmt::Display for ParseParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown parameter value")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseParamError {}

impl FromStr for Engine {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Engine::ALL
            .into_iter()
            .find(|e| e.label().eq_ignore_ascii_case(s.trim()))
            .ok_or(ParseParamError)
    }
}

/// Loop length selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Bars {
    #[default]
    Four = 0,
    Eight = 1,
}

impl Bars {
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Bars::Four),
            1 => Some(Bars::Eight),
            _ => None,
        }
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Number of bars in one loop cycle.
    pub const fn count(self) -> u32 {
        match self {
            Bars::Four => 4,
            Bars::Eight => 8,
        }
    }

    pub const fn from_count(count: u32) -> Option<Self> {
        match count {
            4 => Some(Bars::Four),
            8 => Some(Bars::Eight),
            _ => None,
        }
    }
}

impl FromStr for Bars {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Bars::from_count)
            .ok_or(ParseParamError)
    }
}

/// Upper bound of the variation seed parameter.
pub const MAX_SEED: u32 = 1_000_000;

//! Which venue a candle series came from.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Market {
    Perp,
    Spot,
}

impl Market {
    pub fn name(self) -> &'static str {
        match self {
            Market::Perp => "Perp",
            Market::Spot => "Spot",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Frequency Bands

/// Number of bands produced by the splitter (fixed)
pub const NUM_BANDS: usize = 3;

/// One of the three frequency-limited signal paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    /// All bands in splitter output order
    pub const ALL: [Band; NUM_BANDS] = [Band::Low, Band::Mid, Band::High];

    /// Position of this band in splitter output order
    pub const fn index(self) -> usize {
        match self {
            Band::Low => 0,
            Band::Mid => 1,
            Band::High => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Band::Low => "Low",
            Band::Mid => "Mid",
            Band::High => "High",
        }
    }
}

//! Parameter Model
//!
//! Every control of the compressor is identified by a `ParamId` and described
//! by a static `ParamSpec` table entry. The kind of a parameter is a closed
//! set (`ParamKind`): continuous range, discrete choice or switch. Consumers
//! only ever read numbers and booleans through `ParamValue`.

use triband_dsp::Band;

/// Number of parameters exposed by the engine
pub const NUM_PARAMS: usize = 25;

/// Compression ratios offered by the ratio control (`n:1`)
pub const RATIO_CHOICES: [f32; 14] = [
    1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0, 15.0, 20.0, 50.0, 100.0,
];

/// Stable key of every parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    LowMidCrossoverFreq,
    MidHighCrossoverFreq,

    ThresholdLowBand,
    ThresholdMidBand,
    ThresholdHighBand,

    AttackLowBand,
    AttackMidBand,
    AttackHighBand,

    ReleaseLowBand,
    ReleaseMidBand,
    ReleaseHighBand,

    RatioLowBand,
    RatioMidBand,
    RatioHighBand,

    BypassLowBand,
    BypassMidBand,
    BypassHighBand,

    MuteLowBand,
    MuteMidBand,
    MuteHighBand,

    SoloLowBand,
    SoloMidBand,
    SoloHighBand,

    GainIn,
    GainOut,
}

impl ParamId {
    /// All parameters in table order
    pub const ALL: [ParamId; NUM_PARAMS] = [
        ParamId::LowMidCrossoverFreq,
        ParamId::MidHighCrossoverFreq,
        ParamId::ThresholdLowBand,
        ParamId::ThresholdMidBand,
        ParamId::ThresholdHighBand,
        ParamId::AttackLowBand,
        ParamId::AttackMidBand,
        ParamId::AttackHighBand,
        ParamId::ReleaseLowBand,
        ParamId::ReleaseMidBand,
        ParamId::ReleaseHighBand,
        ParamId::RatioLowBand,
        ParamId::RatioMidBand,
        ParamId::RatioHighBand,
        ParamId::BypassLowBand,
        ParamId::BypassMidBand,
        ParamId::BypassHighBand,
        ParamId::MuteLowBand,
        ParamId::MuteMidBand,
        ParamId::MuteHighBand,
        ParamId::SoloLowBand,
        ParamId::SoloMidBand,
        ParamId::SoloHighBand,
        ParamId::GainIn,
        ParamId::GainOut,
    ];

    /// Position in `PARAM_SPECS` and in the parameter store
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static ParamSpec {
        &PARAM_SPECS[self.index()]
    }

    /// Human-readable name used by hosts and control surfaces
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn kind(self) -> ParamKind {
        self.spec().kind
    }

    /// Look up a parameter by its display name
    pub fn from_name(name: &str) -> Option<ParamId> {
        PARAM_SPECS.iter().find(|spec| spec.name == name).map(|spec| spec.id)
    }

    pub const fn threshold(band: Band) -> ParamId {
        match band {
            Band::Low => ParamId::ThresholdLowBand,
            Band::Mid => ParamId::ThresholdMidBand,
            Band::High => ParamId::ThresholdHighBand,
        }
    }

    pub const fn attack(band: Band) -> ParamId {
        match band {
            Band::Low => ParamId::AttackLowBand,
            Band::Mid => ParamId::AttackMidBand,
            Band::High => ParamId::AttackHighBand,
        }
    }

    pub const fn release(band: Band) -> ParamId {
        match band {
            Band::Low => ParamId::ReleaseLowBand,
            Band::Mid => ParamId::ReleaseMidBand,
            Band::High => ParamId::ReleaseHighBand,
        }
    }

    pub const fn ratio(band: Band) -> ParamId {
        match band {
            Band::Low => ParamId::RatioLowBand,
            Band::Mid => ParamId::RatioMidBand,
            Band::High => ParamId::RatioHighBand,
        }
    }

    pub const fn bypass(band: Band) -> ParamId {
        match band {
            Band::Low => ParamId::BypassLowBand,
            Band::Mid => ParamId::BypassMidBand,
            Band::High => ParamId::BypassHighBand,
        }
    }

    pub const fn mute(band: Band) -> ParamId {
        match band {
            Band::Low => ParamId::MuteLowBand,
            Band::Mid => ParamId::MuteMidBand,
            Band::High => ParamId::MuteHighBand,
        }
    }

    pub const fn solo(band: Band) -> ParamId {
        match band {
            Band::Low => ParamId::SoloLowBand,
            Band::Mid => ParamId::SoloMidBand,
            Band::High => ParamId::SoloHighBand,
        }
    }
}

/// Unit of a continuous parameter (display only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Hertz,
    Decibels,
    Milliseconds,
}

/// What values a parameter accepts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// Real value in `[min, max]`
    Continuous {
        min: f32,
        max: f32,
        default: f32,
        unit: Unit,
    },
    /// Index into a closed list of numeric choices
    Choice {
        choices: &'static [f32],
        default: usize,
    },
    /// On/off switch
    Bool { default: bool },
}

/// Value of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Choice(usize),
    Bool(bool),
}

impl ParamValue {
    /// Numeric view: floats as-is, choice index, switches as 0/1
    pub fn as_f32(self) -> f32 {
        match self {
            ParamValue::Float(v) => v,
            ParamValue::Choice(i) => i as f32,
            ParamValue::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn as_bool(self) -> bool {
        match self {
            ParamValue::Bool(b) => b,
            ParamValue::Choice(i) => i != 0,
            ParamValue::Float(v) => v >= 0.5,
        }
    }

    pub fn as_choice(self) -> usize {
        match self {
            ParamValue::Choice(i) => i,
            ParamValue::Bool(b) => b as usize,
            ParamValue::Float(v) if v.is_finite() && v > 0.0 => v.round() as usize,
            ParamValue::Float(_) => 0,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Choice(value)
    }
}

/// Shorten values above 999 to kilo units, e.g. 2000 Hz -> "2 kHz"
fn kilo(value: f32) -> (f32, &'static str) {
    if value > 999.0 {
        (value / 1000.0, "k")
    } else {
        (value, "")
    }
}

impl ParamKind {
    pub fn default_value(&self) -> ParamValue {
        match *self {
            ParamKind::Continuous { default, .. } => ParamValue::Float(default),
            ParamKind::Choice { default, .. } => ParamValue::Choice(default),
            ParamKind::Bool { default } => ParamValue::Bool(default),
        }
    }

    /// Coerce `value` into this kind and bound it to the valid domain
    ///
    /// Non-finite floats fall back to the default.
    pub fn clamp(&self, value: ParamValue) -> ParamValue {
        match *self {
            ParamKind::Continuous {
                min, max, default, ..
            } => {
                let v = value.as_f32();
                ParamValue::Float(if v.is_finite() { v.clamp(min, max) } else { default })
            }
            ParamKind::Choice { choices, .. } => {
                ParamValue::Choice(value.as_choice().min(choices.len().saturating_sub(1)))
            }
            ParamKind::Bool { .. } => ParamValue::Bool(value.as_bool()),
        }
    }

    /// Map a value onto `[0, 1]` for host automation
    pub fn to_normalized(&self, value: ParamValue) -> f32 {
        match (*self, self.clamp(value)) {
            (ParamKind::Continuous { min, max, .. }, ParamValue::Float(v)) => {
                if max > min {
                    (v - min) / (max - min)
                } else {
                    0.0
                }
            }
            (ParamKind::Choice { choices, .. }, ParamValue::Choice(i)) => {
                if choices.len() > 1 {
                    i as f32 / (choices.len() - 1) as f32
                } else {
                    0.0
                }
            }
            (_, value) => value.as_f32(),
        }
    }

    /// Inverse of `to_normalized`; out-of-range input is clamped to `[0, 1]`
    pub fn from_normalized(&self, normalized: f32) -> ParamValue {
        let n = if normalized.is_finite() {
            normalized.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match *self {
            ParamKind::Continuous { min, max, .. } => ParamValue::Float(min + n * (max - min)),
            ParamKind::Choice { choices, .. } => {
                let last = choices.len().saturating_sub(1);
                ParamValue::Choice((n * last as f32).round() as usize)
            }
            ParamKind::Bool { .. } => ParamValue::Bool(n >= 0.5),
        }
    }

    /// Numeric value a choice stands for (the ratio for ratio controls)
    pub fn choice_value(&self, index: usize) -> Option<f32> {
        match *self {
            ParamKind::Choice { choices, .. } => choices.get(index).copied(),
            _ => None,
        }
    }

    /// Display string, e.g. "400 Hz", "2.5 kHz", "-6.0 dB", "50 ms", "3:1", "On"
    ///
    /// Note: This allocates. Control thread only.
    pub fn display(&self, value: ParamValue) -> String {
        match (*self, self.clamp(value)) {
            (ParamKind::Continuous { unit, .. }, ParamValue::Float(v)) => match unit {
                Unit::Hertz => {
                    let (v, prefix) = kilo(v);
                    if prefix.is_empty() {
                        format!("{:.0} Hz", v)
                    } else {
                        format!("{:.2} {}Hz", v, prefix)
                    }
                }
                Unit::Decibels => format!("{:.1} dB", v),
                Unit::Milliseconds => format!("{:.0} ms", v),
            },
            (ParamKind::Choice { choices, .. }, ParamValue::Choice(i)) => {
                format!("{}:1", choices[i])
            }
            (_, value) => {
                if value.as_bool() {
                    "On".to_string()
                } else {
                    "Off".to_string()
                }
            }
        }
    }
}

/// Table entry describing one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub id: ParamId,
    pub name: &'static str,
    pub kind: ParamKind,
}

const CROSSOVER_LOW_MID: ParamKind = ParamKind::Continuous {
    min: 20.0,
    max: 999.0,
    default: 400.0,
    unit: Unit::Hertz,
};

const CROSSOVER_MID_HIGH: ParamKind = ParamKind::Continuous {
    min: 1000.0,
    max: 20000.0,
    default: 2000.0,
    unit: Unit::Hertz,
};

const THRESHOLD: ParamKind = ParamKind::Continuous {
    min: -60.0,
    max: 12.0,
    default: 0.0,
    unit: Unit::Decibels,
};

const ATTACK: ParamKind = ParamKind::Continuous {
    min: 5.0,
    max: 500.0,
    default: 50.0,
    unit: Unit::Milliseconds,
};

const RELEASE: ParamKind = ParamKind::Continuous {
    min: 5.0,
    max: 500.0,
    default: 250.0,
    unit: Unit::Milliseconds,
};

const RATIO: ParamKind = ParamKind::Choice {
    choices: &RATIO_CHOICES,
    default: 3, // 3:1
};

const SWITCH: ParamKind = ParamKind::Bool { default: false };

const TRIM: ParamKind = ParamKind::Continuous {
    min: -24.0,
    max: 24.0,
    default: 0.0,
    unit: Unit::Decibels,
};

const fn spec(id: ParamId, name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec { id, name, kind }
}

/// Every parameter, indexed by `ParamId::index()`
pub static PARAM_SPECS: [ParamSpec; NUM_PARAMS] = [
    spec(ParamId::LowMidCrossoverFreq, "Low-Mid Crossover Freq", CROSSOVER_LOW_MID),
    spec(ParamId::MidHighCrossoverFreq, "Mid-High Crossover Freq", CROSSOVER_MID_HIGH),
    spec(ParamId::ThresholdLowBand, "Threshold Low Band", THRESHOLD),
    spec(ParamId::ThresholdMidBand, "Threshold Mid Band", THRESHOLD),
    spec(ParamId::ThresholdHighBand, "Threshold High Band", THRESHOLD),
    spec(ParamId::AttackLowBand, "Attack Low Band", ATTACK),
    spec(ParamId::AttackMidBand, "Attack Mid Band", ATTACK),
    spec(ParamId::AttackHighBand, "Attack High Band", ATTACK),
    spec(ParamId::ReleaseLowBand, "Release Low Band", RELEASE),
    spec(ParamId::ReleaseMidBand, "Release Mid Band", RELEASE),
    spec(ParamId::ReleaseHighBand, "Release High Band", RELEASE),
    spec(ParamId::RatioLowBand, "Ratio Low Band", RATIO),
    spec(ParamId::RatioMidBand, "Ratio Mid Band", RATIO),
    spec(ParamId::RatioHighBand, "Ratio High Band", RATIO),
    spec(ParamId::BypassLowBand, "Bypass Low Band", SWITCH),
    spec(ParamId::BypassMidBand, "Bypass Mid Band", SWITCH),
    spec(ParamId::BypassHighBand, "Bypass High Band", SWITCH),
    spec(ParamId::MuteLowBand, "Mute Low Band", SWITCH),
    spec(ParamId::MuteMidBand, "Mute Mid Band", SWITCH),
    spec(ParamId::MuteHighBand, "Mute High Band", SWITCH),
    spec(ParamId::SoloLowBand, "Solo Low Band", SWITCH),
    spec(ParamId::SoloMidBand, "Solo Mid Band", SWITCH),
    spec(ParamId::SoloHighBand, "Solo High Band", SWITCH),
    spec(ParamId::GainIn, "Gain In", TRIM),
    spec(ParamId::GainOut, "Gain Out", TRIM),
];

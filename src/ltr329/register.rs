use super::{Gain, IntegrationTime, MeasurementRate};

pub const REG_CONTROL: u8 = 0x80;
pub const REG_MEAS_RATE: u8 = 0x85;
pub const REG_PART_ID: u8 = 0x86;
pub const REG_MANUFAC_ID: u8 = 0x87;
pub const REG_DATA_CH1_0: u8 = 0x88;
pub const REG_DATA_CH1_1: u8 = 0x89;
pub const REG_DATA_CH0_0: u8 = 0x8A;
pub const REG_DATA_CH0_1: u8 = 0x8B;
pub const REG_STATUS: u8 = 0x8C;

const CONTROL_MODE: u8 = 0b0000_0001;
const CONTROL_RESET: u8 = 0b0000_0010;
const CONTROL_GAIN: u8 = 0b0001_1100;
const CONTROL_LOW_BITS: u8 = CONTROL_MODE | CONTROL_RESET;

const MEAS_RATE_INTEGRATION: u8 = 0b0011_1000;
const MEAS_RATE_REPEAT: u8 = 0b0000_0111;

const STATUS_INVALID: u8 = 0b1000_0000;
const STATUS_GAIN: u8 = 0b0111_0000;
const STATUS_NEW_DATA: u8 = 0b0000_0100;

/// `ALS_CONTR` (0x80): mode in bit 0, software reset in bit 1, gain in bits 4:2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Control(pub u8);

impl Control {
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.0 & CONTROL_MODE != 0
    }

    #[must_use]
    pub const fn is_resetting(self) -> bool {
        self.0 & CONTROL_RESET != 0
    }

    #[must_use]
    pub fn gain(self) -> Gain {
        Gain::from((self.0 & CONTROL_GAIN) >> 2)
    }

    #[must_use]
    pub const fn with_active(self, active: bool) -> Self {
        if active {
            Self(self.0 | CONTROL_MODE)
        } else {
            Self(self.0 & !CONTROL_MODE)
        }
    }

    #[must_use]
    pub const fn with_reset(self) -> Self {
        Self(self.0 | CONTROL_RESET)
    }

    /// Everything above the mode and reset bits is cleared before the gain is placed.
    #[must_use]
    pub fn with_gain(self, gain: Gain) -> Self {
        Self((self.0 & CONTROL_LOW_BITS) | (u8::from(gain) << 2))
    }
}

/// `ALS_MEAS_RATE` (0x85): integration time in bits 5:3, repeat rate in bits 2:0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasRate(pub u8);

impl MeasRate {
    #[must_use]
    pub fn new(integration_time: IntegrationTime, measurement_rate: MeasurementRate) -> Self {
        Self((u8::from(integration_time) << 3) | u8::from(measurement_rate))
    }

    #[must_use]
    pub fn integration_time(self) -> IntegrationTime {
        IntegrationTime::from((self.0 & MEAS_RATE_INTEGRATION) >> 3)
    }

    #[must_use]
    pub fn measurement_rate(self) -> MeasurementRate {
        MeasurementRate::from(self.0 & MEAS_RATE_REPEAT)
    }
}

/// `ALS_STATUS` (0x8C): data invalid in bit 7, gain in bits 6:4, new data in bit 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(pub u8);

impl Status {
    /// The last measurement did not overflow.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 & STATUS_INVALID == 0
    }

    /// Raw gain bits, including the reserved codes 4 and 5.
    #[must_use]
    pub const fn gain_code(self) -> u8 {
        (self.0 & STATUS_GAIN) >> 4
    }

    #[must_use]
    pub fn gain(self) -> Gain {
        Gain::from(self.gain_code())
    }

    /// A measurement has landed in the data registers since they were last read.
    #[must_use]
    pub const fn has_new_data(self) -> bool {
        self.0 & STATUS_NEW_DATA != 0
    }
}

/// `PART_ID` (0x86): part number in bits 7:4, revision in bits 3:0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartId(pub u8);

impl PartId {
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0 >> 4
    }

    #[must_use]
    pub const fn revision(self) -> u8 {
        self.0 & 0x0F
    }
}

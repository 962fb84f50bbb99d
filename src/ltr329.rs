//! # Rust Driver for LITE-ON LTR-329ALS-01 Ambient Light Sensor
//!
//! Dual channel (visible + IR and IR only) photodiode sensor with a 16-bit result per channel.
//! Illuminance is derived from the ratio of the two channels after normalising for gain and
//! integration time.
//!
//! ## External Links
//!
//! - [Datasheet]
//! - [Appendix A]
//!
//! [Datasheet]: https://optoelectronics.liteon.com/upload/download/DS86-2014-0006/LTR-329ALS-01_DS_V1.6.PDF
//! [Appendix A]: https://github.com/aniketpalu/LTR303/blob/main/LTR-303%20329_Appendix%20A%20Ver_1.0_22%20Feb%202013.pdf

use crate::{Driver, WhoAmI};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
use num_enum::{FromPrimitive, IntoPrimitive};

pub mod helper;
pub mod register;
pub mod whoami;

use register::{
    Control, MeasRate, PartId, Status, REG_CONTROL, REG_DATA_CH0_0, REG_DATA_CH0_1,
    REG_DATA_CH1_0, REG_DATA_CH1_1, REG_MEAS_RATE, REG_STATUS,
};

pub const DEFAULT_ADDRESS: u8 = 0x29;

const MODE_CHANGE_DELAY_MS: u32 = 10;
const RESET_DELAY_MS: u32 = 100;
const READ_SETTLE_MS: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    /// 1 lux to 64k lux
    #[default]
    Gain1x = 0,
    /// 0.5 lux to 32k lux
    Gain2x = 1,
    /// 0.25 lux to 16k lux
    Gain4x = 2,
    /// 0.125 lux to 8k lux
    Gain8x = 3,
    /// 0.02 lux to 1.3k lux
    Gain48x = 6,
    /// 0.01 lux to 600 lux
    Gain96x = 7,
}

impl Gain {
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Gain1x => 1.0,
            Self::Gain2x => 2.0,
            Self::Gain4x => 4.0,
            Self::Gain8x => 8.0,
            Self::Gain48x => 48.0,
            Self::Gain96x => 96.0,
        }
    }
}

/// Time spent accumulating light for a single measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IntegrationTime {
    #[default]
    Ms100 = 0,
    Ms50 = 1,
    Ms200 = 2,
    Ms400 = 3,
    Ms150 = 4,
    Ms250 = 5,
    Ms300 = 6,
    Ms350 = 7,
}

impl IntegrationTime {
    #[must_use]
    pub const fn millis(self) -> u32 {
        match self {
            Self::Ms100 => 100,
            Self::Ms50 => 50,
            Self::Ms200 => 200,
            Self::Ms400 => 400,
            Self::Ms150 => 150,
            Self::Ms250 => 250,
            Self::Ms300 => 300,
            Self::Ms350 => 350,
        }
    }

    /// Scale of this integration time relative to 100 ms.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Ms100 => 1.0,
            Self::Ms50 => 0.5,
            Self::Ms200 => 2.0,
            Self::Ms400 => 4.0,
            Self::Ms150 => 1.5,
            Self::Ms250 => 2.5,
            Self::Ms300 => 3.0,
            Self::Ms350 => 3.5,
        }
    }
}

/// Interval between updates of the data registers.  Should be no shorter than the
/// [`IntegrationTime`] in use, which the device does not check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MeasurementRate {
    Ms50 = 0,
    Ms100 = 1,
    Ms200 = 2,
    #[default]
    Ms500 = 3,
    Ms1000 = 4,
    Ms2000 = 5,
    /// Alternate encoding of 2000 ms.
    Reserved6 = 6,
    /// Alternate encoding of 2000 ms.
    Reserved7 = 7,
}

impl MeasurementRate {
    #[must_use]
    pub const fn millis(self) -> u32 {
        match self {
            Self::Ms50 => 50,
            Self::Ms100 => 100,
            Self::Ms200 => 200,
            Self::Ms500 => 500,
            Self::Ms1000 => 1000,
            Self::Ms2000 | Self::Reserved6 | Self::Reserved7 => 2000,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    pub integration_time: IntegrationTime,
    pub measurement_rate: MeasurementRate,
}

impl Timing {
    /// Whether the data registers refresh no faster than a measurement completes.
    #[must_use]
    pub const fn is_consistent(self) -> bool {
        self.measurement_rate.millis() >= self.integration_time.millis()
    }
}

/// Outcome of the most recent bus operation, numbered like the Arduino `Wire` status codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TransportStatus {
    #[default]
    Success = 0,
    DataTooLong = 1,
    AddressNack = 2,
    DataNack = 3,
    Other = 4,
}

impl From<ErrorKind> for TransportStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Overrun => Self::DataTooLong,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => Self::AddressNack,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => Self::DataNack,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    I2cError(E),
    /// Part number or manufacturer did not match an LTR-329.
    UnexpectedDevice,
    /// New data was not signalled within the [`PollPolicy`].
    Timeout,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::I2cError(error)
    }
}

/// Bounds on waiting for the new data flag.  Each attempt is one status read followed by
/// `interval_ms` of delay.  A status read that fails on the bus still uses up an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval_ms: u32,
}

impl Default for PollPolicy {
    /// 2.5 s, enough for the slowest measurement rate.
    fn default() -> Self {
        Self {
            max_attempts: 250,
            interval_ms: 10,
        }
    }
}

/// A pair of channel counts together with the status read that followed them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Visible + IR
    pub ch0: u16,
    /// IR
    pub ch1: u16,
    pub valid: bool,
    pub gain: Gain,
    /// `false` when the data registers could not be read and the counts are from an earlier
    /// measurement.
    pub fresh: bool,
}

impl Measurement {
    /// Illuminance in lux, or 0.0 if the device flagged the measurement as invalid.
    #[must_use]
    pub fn lux(&self, integration_time: IntegrationTime) -> f64 {
        if self.valid {
            helper::lux_from(self.ch0, self.ch1, self.gain, integration_time)
        } else {
            0.0
        }
    }
}

pub struct Ltr329<I2C, DELAY> {
    i2c: I2C,
    address: u8,
    delay: DELAY,
    poll: PollPolicy,
    gain: Gain,
    active: bool,
    resetting: bool,
    timing: Timing,
    timing_confirmed: bool,
    status: Option<Status>,
    ch0: u16,
    ch1: u16,
    part_id: PartId,
    manufacturer_id: u8,
    last_error: TransportStatus,
}

impl<I2C: I2c, DELAY: DelayNs> Driver<I2C, DELAY, Error<I2C::Error>> for Ltr329<I2C, DELAY> {
    fn new_inner(i2c: I2C, address: u8, delay: DELAY) -> Self {
        Self {
            i2c,
            address,
            delay,
            poll: PollPolicy::default(),
            gain: Gain::default(),
            active: false,
            resetting: false,
            timing: Timing::default(),
            timing_confirmed: false,
            status: None,
            ch0: 0,
            ch1: 0,
            part_id: PartId::default(),
            manufacturer_id: 0,
            last_error: TransportStatus::Success,
        }
    }

    fn init_inner(mut self) -> Result<Self, Error<I2C::Error>> {
        if self.whoami()? != <Self as WhoAmI<I2C, (u8, u8)>>::EXPECTED_WHOAMI {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "unexpected device: part {=u8:#x} manufacturer {=u8:#x}",
                self.part_id.number(),
                self.manufacturer_id
            );
            return Err(Error::UnexpectedDevice);
        }
        self.reset()?;
        // the device comes out of reset in standby
        self.activate()?;
        // the first conversion after activation is garbage
        self.read_data()?;
        Ok(self)
    }
}

/// Lets an acquisition step fail on the bus without ending the cycle.  Timeouts still end it.
fn tolerate<T, E>(result: Result<T, Error<E>>) -> Result<Option<T>, Error<E>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::Timeout) => Err(Error::Timeout),
        Err(_) => Ok(None),
    }
}

impl<I2C: I2c, DELAY: DelayNs> Ltr329<I2C, DELAY> {
    fn track<T>(&mut self, result: Result<T, I2C::Error>) -> Result<T, I2C::Error> {
        self.last_error = match &result {
            Ok(_) => TransportStatus::Success,
            Err(error) => TransportStatus::from(error.kind()),
        };
        result
    }

    fn read_register(&mut self, register: u8) -> Result<u8, I2C::Error> {
        let mut data: [u8; 1] = [0];
        let result = self.i2c.write_read(self.address, &[register], &mut data);
        self.track(result)?;
        self.delay.delay_ms(READ_SETTLE_MS);
        Ok(data[0])
    }

    /// Any write leaves the cached status stale until the next [`Ltr329::read_status`].
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2C::Error> {
        self.status = None;
        let result = self.i2c.write(self.address, &[register, value]);
        self.track(result)
    }

    /// Switches the device into active mode, where it measures continuously.
    pub fn activate(&mut self) -> Result<(), I2C::Error> {
        let control = Control(self.read_register(REG_CONTROL)?).with_active(true);
        self.write_register(REG_CONTROL, control.0)?;
        self.active = true;
        self.delay.delay_ms(MODE_CHANGE_DELAY_MS);
        Ok(())
    }

    pub fn standby(&mut self) -> Result<(), I2C::Error> {
        let control = Control(self.read_register(REG_CONTROL)?).with_active(false);
        self.write_register(REG_CONTROL, control.0)?;
        self.active = false;
        self.delay.delay_ms(MODE_CHANGE_DELAY_MS);
        Ok(())
    }

    /// Software reset.  Gain, timing and mode return to their defaults and the device is left in
    /// standby.  Cached settings are kept so they can be written back.
    pub fn reset(&mut self) -> Result<(), I2C::Error> {
        let control = Control(self.read_register(REG_CONTROL)?).with_reset();
        self.write_register(REG_CONTROL, control.0)?;
        self.delay.delay_ms(RESET_DELAY_MS);
        Ok(())
    }

    /// Writes a new gain and reads the control register back.  Raw codes 4, 5 and anything above
    /// 7 are reserved and fall back to [`Gain::Gain1x`].
    pub fn set_gain<G: Into<Gain>>(&mut self, gain: G) -> Result<(), I2C::Error> {
        let control = Control(self.read_register(REG_CONTROL)?).with_gain(gain.into());
        self.write_register(REG_CONTROL, control.0)?;
        self.get_control()?;
        Ok(())
    }

    pub fn get_control(&mut self) -> Result<Control, I2C::Error> {
        let control = Control(self.read_register(REG_CONTROL)?);
        self.gain = control.gain();
        self.resetting = control.is_resetting();
        self.active = control.is_active();
        Ok(control)
    }

    /// Raw codes above 7 fall back to [`IntegrationTime::Ms100`] and [`MeasurementRate::Ms500`]
    /// respectively.
    ///
    /// The cached [`Timing`] is updated even if the write fails, in which case
    /// [`Ltr329::timing_confirmed`] reports `false` until [`Ltr329::get_measurement_rate`]
    /// succeeds.
    pub fn set_measurement_rate<T, M>(
        &mut self,
        integration_time: T,
        measurement_rate: M,
    ) -> Result<(), I2C::Error>
    where
        T: Into<IntegrationTime>,
        M: Into<MeasurementRate>,
    {
        let timing = Timing {
            integration_time: integration_time.into(),
            measurement_rate: measurement_rate.into(),
        };
        #[cfg(feature = "defmt")]
        {
            if !timing.is_consistent() {
                defmt::warn!("measurement rate shorter than integration time: {}", timing);
            }
        }
        self.timing = timing;
        let result = self.write_register(
            REG_MEAS_RATE,
            MeasRate::new(timing.integration_time, timing.measurement_rate).0,
        );
        self.timing_confirmed = result.is_ok();
        result
    }

    /// Same as [`Ltr329::set_measurement_rate`] with the default 500 ms rate.
    pub fn set_integration_time<T: Into<IntegrationTime>>(
        &mut self,
        integration_time: T,
    ) -> Result<(), I2C::Error> {
        self.set_measurement_rate(integration_time, MeasurementRate::default())
    }

    pub fn get_measurement_rate(&mut self) -> Result<Timing, I2C::Error> {
        let reg = MeasRate(self.read_register(REG_MEAS_RATE)?);
        self.timing = Timing {
            integration_time: reg.integration_time(),
            measurement_rate: reg.measurement_rate(),
        };
        self.timing_confirmed = true;
        Ok(self.timing)
    }

    pub fn read_status(&mut self) -> Result<Status, I2C::Error> {
        let status = Status(self.read_register(REG_STATUS)?);
        self.status = Some(status);
        self.gain = status.gain();
        Ok(status)
    }

    fn wait_for_data(&mut self) -> Result<(), Error<I2C::Error>> {
        for _ in 0..self.poll.max_attempts {
            let ready = self.read_status().is_ok_and(Status::has_new_data);
            self.delay.delay_ms(self.poll.interval_ms);
            if ready {
                return Ok(());
            }
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("no new data after {} polls", self.poll.max_attempts);
        Err(Error::Timeout)
    }

    fn measurement(&self, status: Status, fresh: bool) -> Measurement {
        Measurement {
            ch0: self.ch0,
            ch1: self.ch1,
            valid: status.is_valid(),
            gain: status.gain(),
            fresh,
        }
    }

    /// Waits for new data, then reads all four data registers in one transfer.
    ///
    /// If the transfer fails the previous counts are kept and the returned [`Measurement`] is
    /// marked as not fresh.  Validity always comes from a status read made afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] if no new data shows up within the [`PollPolicy`], or the bus error of
    /// the closing status read.
    pub fn read_data(&mut self) -> Result<Measurement, Error<I2C::Error>> {
        self.wait_for_data()?;

        let mut data: [u8; 4] = [0; 4];
        let result = self
            .i2c
            .write_read(self.address, &[REG_DATA_CH1_0], &mut data);
        let fresh = self.track(result).is_ok();
        if fresh {
            self.ch1 = u16::from_le_bytes([data[0], data[1]]);
            self.ch0 = u16::from_le_bytes([data[2], data[3]]);
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("data read failed: {}", self.last_error);
        }

        let status = self.read_status()?;
        Ok(self.measurement(status, fresh))
    }

    /// Like [`Ltr329::read_data`] but one register at a time, channel 1 first as the datasheet
    /// asks.  Any bus error aborts the read.
    pub fn get_data(&mut self) -> Result<Measurement, Error<I2C::Error>> {
        self.wait_for_data()?;

        let ch1_low = self.read_register(REG_DATA_CH1_0)?;
        let ch1_high = self.read_register(REG_DATA_CH1_1)?;
        let ch0_low = self.read_register(REG_DATA_CH0_0)?;
        let ch0_high = self.read_register(REG_DATA_CH0_1)?;
        self.ch1 = u16::from_le_bytes([ch1_low, ch1_high]);
        self.ch0 = u16::from_le_bytes([ch0_low, ch0_high]);

        let status = self.read_status()?;
        Ok(self.measurement(status, true))
    }

    /// Measures at 1x gain and switches to the highest gain that keeps the channel sum in range,
    /// then takes one reading at that gain.  There is no second pass if that reading saturates.
    pub fn auto_gain(&mut self) -> Result<Gain, Error<I2C::Error>> {
        self.set_gain(Gain::Gain1x)?;
        let measurement = self.read_data()?;
        let sum = u32::from(measurement.ch0) + u32::from(measurement.ch1);

        if let Some(gain) = helper::select_gain(sum) {
            self.set_gain(gain)?;
            self.read_data()?;
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("auto gain: sum {} -> {}", sum, self.gain);
        Ok(self.gain)
    }

    /// Runs a full acquisition and converts it to lux.
    ///
    /// An overflowed first reading at a gain code other than 1x triggers a reset, after which
    /// the cached timing is written back and the device is reactivated.  Auto gain then always
    /// runs, a final reading is taken and the timing is read back from the device for
    /// normalisation.
    ///
    /// Bus errors never abort the cycle.  A failed first reading gives 0.0 straight away, later
    /// failures fall back to the cached counts, gain and timing.  Returns 0.0 when the last
    /// status read was invalid or the counts are out of the formula's range.
    ///
    /// # Errors
    ///
    /// Only [`Error::Timeout`], when a reading never reports new data.
    pub fn read_lux(&mut self) -> Result<f64, Error<I2C::Error>> {
        let Some(first) = tolerate(self.read_data())? else {
            return Ok(0.0);
        };
        if !first.valid && self.status.is_some_and(|status| status.gain_code() != 0) {
            #[cfg(feature = "defmt")]
            defmt::warn!("invalid data at {}, resetting", first.gain);
            let Timing {
                integration_time,
                measurement_rate,
            } = self.timing;
            let _ = self.reset();
            let _ = self.set_measurement_rate(integration_time, measurement_rate);
            let _ = self.activate();
            tolerate(self.read_data())?;
        }

        tolerate(self.auto_gain())?;
        tolerate(self.read_data())?;
        let _ = self.get_measurement_rate();

        let lux = if self.is_valid() {
            helper::lux_from(self.ch0, self.ch1, self.gain, self.timing.integration_time)
        } else {
            0.0
        };

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "gain {} valid {} ch0 {} ch1 {} ratio {} integration {} ms lux {}",
            self.gain,
            self.is_valid(),
            self.ch0,
            self.ch1,
            helper::ratio(self.ch0, self.ch1),
            self.timing.integration_time.millis(),
            lux
        );
        Ok(lux)
    }

    /// Validity of the last status read.  `false` when a register has been written since.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status.is_some_and(Status::is_valid)
    }

    #[must_use]
    pub fn has_new_data(&self) -> bool {
        self.status.is_some_and(Status::has_new_data)
    }

    #[must_use]
    pub const fn status(&self) -> Option<Status> {
        self.status
    }

    #[must_use]
    pub const fn gain(&self) -> Gain {
        self.gain
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub const fn is_resetting(&self) -> bool {
        self.resetting
    }

    /// Last `(ch0, ch1)` counts.  Only meaningful while [`Ltr329::is_valid`].
    #[must_use]
    pub const fn channels(&self) -> (u16, u16) {
        (self.ch0, self.ch1)
    }

    #[must_use]
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    #[must_use]
    pub const fn timing_confirmed(&self) -> bool {
        self.timing_confirmed
    }

    #[must_use]
    pub const fn last_error(&self) -> TransportStatus {
        self.last_error
    }

    #[must_use]
    pub const fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    pub fn set_poll_policy(&mut self, poll: PollPolicy) {
        self.poll = poll;
    }

    /// Gives back the bus and delay.
    pub fn release(self) -> (I2C, DELAY) {
        (self.i2c, self.delay)
    }
}

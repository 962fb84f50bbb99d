use super::register::{PartId, REG_MANUFAC_ID, REG_PART_ID};
use super::Ltr329;
use crate::WhoAmI;
use embedded_hal::{delay::DelayNs, i2c::I2c};

impl<I2C: I2c, DELAY: DelayNs> WhoAmI<I2C, (u8, u8)> for Ltr329<I2C, DELAY> {
    /// Part number 0x0A, manufacturer 0x05 (LITE-ON).
    const EXPECTED_WHOAMI: (u8, u8) = (0x0A, 0x05);

    fn whoami(&mut self) -> Result<(u8, u8), I2C::Error> {
        let part_id = self.get_part_id()?;
        let manufacturer_id = self.get_manufacturer_id()?;
        Ok((part_id.number(), manufacturer_id))
    }
}

impl<I2C: I2c, DELAY: DelayNs> Ltr329<I2C, DELAY> {
    pub fn get_part_id(&mut self) -> Result<PartId, I2C::Error> {
        self.part_id = PartId(self.read_register(REG_PART_ID)?);
        Ok(self.part_id)
    }

    pub fn get_manufacturer_id(&mut self) -> Result<u8, I2C::Error> {
        self.manufacturer_id = self.read_register(REG_MANUFAC_ID)?;
        Ok(self.manufacturer_id)
    }

    /// Part number and revision from the last [`Ltr329::get_part_id`].
    #[must_use]
    pub const fn part_id(&self) -> PartId {
        self.part_id
    }

    #[must_use]
    pub const fn manufacturer_id(&self) -> u8 {
        self.manufacturer_id
    }
}

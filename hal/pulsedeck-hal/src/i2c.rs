//! I2C bus abstractions
//!
//! Backlight controller and fuel gauge on the display sit on one I2C bus
//! that the touch controller shares.

/// I2C bus master
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Write one 8-bit register
    fn write_reg(&mut self, address: u8, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.write(address, &[reg, value])
    }

    /// Read one big-endian 16-bit register
    fn read_reg_u16(&mut self, address: u8, reg: u8) -> Result<u16, Self::Error> {
        let mut buf = [0u8; 2];
        self.write_read(address, &[reg], &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }
}

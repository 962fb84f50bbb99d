#![no_std]
#![no_main]

#[cfg(not(target_os = "none"))]
mod other {
    extern crate std;
    use std::println;
    #[no_mangle]
    pub extern "C" fn main() {
        println!("unsupported target");
    }
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod arm {
    use ltr329_als::{Driver, IntegrationTime, Ltr329, MeasurementRate, DEFAULT_ADDRESS};

    use defmt::*;
    use defmt_rtt as _;
    use embedded_hal::delay::DelayNs;
    use fugit::RateExtU32;
    use panic_probe as _;
    use rp2040_hal::{
        clocks::init_clocks_and_plls,
        entry,
        gpio::{FunctionI2C, Pin, PullUp},
        pac,
        sio::Sio,
        watchdog::Watchdog,
        Timer, I2C,
    };

    #[link_section = ".boot2"]
    #[used]
    pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

    #[entry]
    fn main() -> ! {
        let mut pac = pac::Peripherals::take().unwrap();
        let mut watchdog = Watchdog::new(pac.WATCHDOG);
        let sio = Sio::new(pac.SIO);

        let external_xtal_freq_hz = 12_000_000u32;
        let clocks = init_clocks_and_plls(
            external_xtal_freq_hz,
            pac.XOSC,
            pac.CLOCKS,
            pac.PLL_SYS,
            pac.PLL_USB,
            &mut pac.RESETS,
            &mut watchdog,
        )
        .ok()
        .unwrap();

        let pins = rp2040_hal::gpio::Pins::new(
            pac.IO_BANK0,
            pac.PADS_BANK0,
            sio.gpio_bank0,
            &mut pac.RESETS,
        );

        let sda: Pin<_, FunctionI2C, PullUp> = pins.gpio8.reconfigure();
        let scl: Pin<_, FunctionI2C, PullUp> = pins.gpio9.reconfigure();
        let i2c = I2C::i2c0(
            pac.I2C0,
            sda,
            scl,
            400.kHz(),
            &mut pac.RESETS,
            &clocks.system_clock,
        );

        let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

        let mut ltr329 = Ltr329::new(i2c, DEFAULT_ADDRESS, timer)
            .unwrap()
            .init()
            .unwrap();
        ltr329
            .set_measurement_rate(IntegrationTime::Ms200, MeasurementRate::Ms500)
            .unwrap();

        loop {
            match ltr329.read_lux() {
                Ok(lux) => println!("{} lux", lux),
                Err(_) => println!("no data, bus status {}", ltr329.last_error() as u8),
            }
            timer.delay_ms(1000);
        }
    }
}

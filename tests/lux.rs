#![cfg(not(all(target_arch = "arm", target_os = "none")))]

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use ltr329_als::{Driver, Gain, IntegrationTime, Ltr329, DEFAULT_ADDRESS};

fn read(register: u8, value: u8) -> I2cTransaction {
    I2cTransaction::write_read(DEFAULT_ADDRESS, vec![register], vec![value])
}

fn write(register: u8, value: u8) -> I2cTransaction {
    I2cTransaction::write(DEFAULT_ADDRESS, vec![register, value])
}

fn data(ch0: u16, ch1: u16, status: u8) -> Vec<I2cTransaction> {
    let [ch1_low, ch1_high] = ch1.to_le_bytes();
    let [ch0_low, ch0_high] = ch0.to_le_bytes();
    vec![
        read(0x8C, status | 0x04),
        I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0x88],
            vec![ch1_low, ch1_high, ch0_low, ch0_high],
        ),
        read(0x8C, status),
    ]
}

fn init() -> Vec<I2cTransaction> {
    let mut expectations = vec![
        read(0x86, 0xA0),
        read(0x87, 0x05),
        read(0x80, 0x00),
        write(0x80, 0x02),
        read(0x80, 0x00),
        write(0x80, 0x01),
    ];
    expectations.extend(data(0, 0, 0x00));
    expectations
}

#[test]
fn dim_room_switches_to_high_gain() {
    let mut expectations = init();
    expectations.push(write(0x85, 0x13));
    expectations.extend(data(200, 50, 0x00));
    expectations.extend([read(0x80, 0x01), write(0x80, 0x01), read(0x80, 0x01)]);
    expectations.extend(data(200, 50, 0x00));
    expectations.extend([read(0x80, 0x01), write(0x80, 0x1D), read(0x80, 0x1D)]);
    expectations.extend(data(19_200, 4_800, 0x70));
    expectations.extend(data(19_200, 4_800, 0x70));
    expectations.push(read(0x85, 0x13));

    let mut ltr329 = Ltr329::new(I2cMock::new(&expectations), DEFAULT_ADDRESS, NoopDelay::new())
        .unwrap()
        .init()
        .unwrap();
    ltr329.set_integration_time(IntegrationTime::Ms200).unwrap();

    let lux = ltr329.read_lux().unwrap();
    let expected = (1.7743 * 19_200.0 + 1.1059 * 4_800.0) * (1.0 / 2.0) / 96.0;
    assert!((lux - expected).abs() < 1e-9);
    assert_eq!(ltr329.gain(), Gain::Gain96x);
    assert!(ltr329.is_valid());

    let (mut i2c, _) = ltr329.release();
    i2c.done();
}

#[test]
fn repeated_readings_share_one_driver() {
    let mut expectations = init();
    for _ in 0..2 {
        expectations.extend(data(500, 100, 0x00));
        expectations.extend([read(0x80, 0x01), write(0x80, 0x01), read(0x80, 0x01)]);
        expectations.extend(data(500, 100, 0x00));
        // sum of 600 lands in the 48x band
        expectations.extend([read(0x80, 0x01), write(0x80, 0x19), read(0x80, 0x19)]);
        expectations.extend(data(24_000, 4_800, 0x60));
        expectations.extend(data(24_000, 4_800, 0x60));
        expectations.push(read(0x85, 0x03));
    }

    let mut ltr329 = Ltr329::new(I2cMock::new(&expectations), DEFAULT_ADDRESS, NoopDelay::new())
        .unwrap()
        .init()
        .unwrap();

    let expected = (1.7743 * 24_000.0 + 1.1059 * 4_800.0) / 48.0;
    for _ in 0..2 {
        let lux = ltr329.read_lux().unwrap();
        assert!((lux - expected).abs() < 1e-9);
    }

    let (mut i2c, _) = ltr329.release();
    i2c.done();
}

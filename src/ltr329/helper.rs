use super::{Gain, IntegrationTime};

/// Upper bounds on `ch0 + ch1` paired with the gain that keeps such a signal inside the 16-bit
/// range, evaluated low to high.
pub const AUTO_GAIN_THRESHOLDS: [(u32, Gain); 6] = [
    (600, Gain::Gain96x),
    (1300, Gain::Gain48x),
    (8192, Gain::Gain8x),
    (16384, Gain::Gain4x),
    (32768, Gain::Gain2x),
    (65535, Gain::Gain1x),
];

/// Channel sum at which the data registers are saturated.
pub const OVERFLOW_SUM: u32 = 0xFFFF;

/// Picks the gain for a channel sum measured at [`Gain::Gain1x`].  `None` when the sum is at or
/// beyond saturation and no threshold applies.
#[must_use]
pub fn select_gain(sum: u32) -> Option<Gain> {
    AUTO_GAIN_THRESHOLDS
        .iter()
        .find(|&&(bound, _)| sum < bound)
        .map(|&(_, gain)| gain)
}

/// `ch1 / (ch0 + ch1)`, or `None` when both channels are dark.
#[must_use]
pub fn ratio(ch0: u16, ch1: u16) -> Option<f64> {
    let sum = u32::from(ch0) + u32::from(ch1);
    if sum == 0 {
        None
    } else {
        Some(f64::from(ch1) / f64::from(sum))
    }
}

/// Converts a valid pair of channel counts into lux.
///
/// The counts are normalised to 1x gain and a 100 ms integration time, then one of three linear
/// fits is chosen by the IR ratio.  Ratios of 0.85 and above, dark readings and saturated sums
/// all give 0.0.
#[must_use]
pub fn lux_from(ch0: u16, ch1: u16, gain: Gain, integration_time: IntegrationTime) -> f64 {
    if u32::from(ch0) + u32::from(ch1) >= OVERFLOW_SUM {
        return 0.0;
    }
    let Some(ratio) = ratio(ch0, ch1) else {
        return 0.0;
    };
    let factor = (1.0 / integration_time.factor()) / gain.factor();
    let (ch0, ch1) = (f64::from(ch0), f64::from(ch1));

    if ratio < 0.45 {
        (1.7743 * ch0 + 1.1059 * ch1) * factor
    } else if ratio < 0.64 {
        (4.2785 * ch0 - 1.9548 * ch1) * factor
    } else if ratio < 0.85 {
        (0.5926 * ch0 + 0.1185 * ch1) * factor
    } else {
        0.0
    }
}

//! Swiss grid to WGS84 conversion.
//!
//! Stop coordinates in the registry are published in the Swiss LV95 grid
//! (easting/northing in metres). This module converts them to latitude and
//! longitude with swisstopo's approximate formulas, which are accurate to
//! about a metre across Switzerland. Older LV03 values (six-digit eastings)
//! are shifted into LV95 first.

use crate::domain::LatLon;

/// LV95 false easting of the Bern origin.
const LV95_EASTING_ORIGIN: f64 = 2_600_000.0;
/// LV95 false northing of the Bern origin.
const LV95_NORTHING_ORIGIN: f64 = 1_200_000.0;

/// Offsets between the LV03 and LV95 grids.
const LV03_EASTING_SHIFT: f64 = 2_000_000.0;
const LV03_NORTHING_SHIFT: f64 = 1_000_000.0;

/// Extent accepted by the approximation (LV95), generous around Switzerland.
const EASTING_RANGE: (f64, f64) = (2_400_000.0, 2_900_000.0);
const NORTHING_RANGE: (f64, f64) = (1_000_000.0, 1_400_000.0);

/// Error converting grid coordinates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// One of the inputs is NaN or infinite
    #[error("coordinate is not finite: E={easting}, N={northing}")]
    NotFinite { easting: f64, northing: f64 },

    /// The point lies outside the Swiss grid
    #[error("coordinate outside the Swiss grid: E={easting}, N={northing}")]
    OutOfDomain { easting: f64, northing: f64 },
}

/// Convert an LV95 (or LV03) easting/northing pair to WGS84.
///
/// Pure and deterministic: identical inputs always produce bit-identical
/// outputs.
///
/// # Examples
///
/// ```
/// use transit_fusion::projection::project;
///
/// let bern = project(2_600_000.0, 1_200_000.0).unwrap();
/// assert!((bern.lat - 46.951081).abs() < 1e-6);
/// assert!((bern.lon - 7.438637).abs() < 1e-6);
/// ```
pub fn project(easting: f64, northing: f64) -> Result<LatLon, ConversionError> {
    if !easting.is_finite() || !northing.is_finite() {
        return Err(ConversionError::NotFinite { easting, northing });
    }

    let (e, n) = if easting < 1_000_000.0 && northing < 1_000_000.0 {
        (easting + LV03_EASTING_SHIFT, northing + LV03_NORTHING_SHIFT)
    } else {
        (easting, northing)
    };

    if !(EASTING_RANGE.0..=EASTING_RANGE.1).contains(&e)
        || !(NORTHING_RANGE.0..=NORTHING_RANGE.1).contains(&n)
    {
        return Err(ConversionError::OutOfDomain { easting, northing });
    }

    // Auxiliary values in units of 1000 km relative to Bern
    let y = (e - LV95_EASTING_ORIGIN) / 1_000_000.0;
    let x = (n - LV95_NORTHING_ORIGIN) / 1_000_000.0;

    // Results in units of 10000"
    let lon = 2.6779094 + 4.728982 * y + 0.791484 * y * x + 0.1306 * y * x * x
        - 0.0436 * y * y * y;
    let lat = 16.9023892 + 3.238272 * x
        - 0.270978 * y * y
        - 0.002528 * x * x
        - 0.0447 * y * y * x
        - 0.0140 * x * x * x;

    Ok(LatLon::new(lat * 100.0 / 36.0, lon * 100.0 / 36.0))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Same input, same output, to the bit
        #[test]
        fn deterministic(e in 2_450_000.0f64..2_850_000.0, n in 1_050_000.0f64..1_350_000.0) {
            let a = project(e, n).unwrap();
            let b = project(e, n).unwrap();
            prop_assert_eq!(a.lat.to_bits(), b.lat.to_bits());
            prop_assert_eq!(a.lon.to_bits(), b.lon.to_bits());
        }

        /// Results stay within a box around Switzerland
        #[test]
        fn stays_near_switzerland(e in 2_450_000.0f64..2_850_000.0, n in 1_050_000.0f64..1_350_000.0) {
            let p = project(e, n).unwrap();
            prop_assert!((45.0..48.5).contains(&p.lat));
            prop_assert!((5.0..11.5).contains(&p.lon));
        }
    }
}

//! Maidenhead locator encoding and geodesy helpers.
//!
//! The 4-character locator is packed into the 15-bit field of the payload
//! with the WSPR formula `180·(179 − 10·f1 − s1) + 10·f2 + s2`. The
//! utilities (`grid_distance_km`, `latlon_to_grid`) operate on 4- or
//! 6-character locators and are part of the crate boundary rather than the
//! codec itself.

use snafu::Snafu;

use super::MessageError;

/// Errors from the Maidenhead utility operations.
#[derive(Debug, Snafu, PartialEq)]
pub enum GridError {
    /// Locator text is not a valid 4- or 6-character Maidenhead grid
    #[snafu(display("invalid Maidenhead locator '{grid}'"))]
    InvalidLocator { grid: String },

    /// Latitude/longitude outside the representable range (or NaN)
    #[snafu(display("latitude/longitude out of range: ({lat}, {lon})"))]
    LatLonOutOfRange { lat: f64, lon: f64 },

    /// Spherical law of cosines is singular for antipodal squares
    #[snafu(display("grid squares are antipodal"))]
    Antipodal,
}

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

fn field_values(grid: &str) -> Result<(u32, u32, u32, u32), MessageError> {
    let chars: Vec<char> = grid.trim().to_uppercase().chars().collect();
    if chars.len() != 4 {
        return Err(MessageError::InvalidGrid { grid: grid.to_string() });
    }
    let f1 = chars[0] as i32 - 'A' as i32;
    let f2 = chars[1] as i32 - 'A' as i32;
    if !(0..18).contains(&f1) || !(0..18).contains(&f2) {
        return Err(MessageError::InvalidGrid { grid: grid.to_string() });
    }
    let s1 = chars[2].to_digit(10);
    let s2 = chars[3].to_digit(10);
    match (s1, s2) {
        (Some(s1), Some(s2)) => Ok((f1 as u32, f2 as u32, s1, s2)),
        _ => Err(MessageError::InvalidGrid { grid: grid.to_string() }),
    }
}

/// Pack a 4-character locator into its 15-bit field value.
pub fn pack_grid(grid: &str) -> Result<u32, MessageError> {
    let (f1, f2, s1, s2) = field_values(grid)?;
    Ok(180 * (179 - 10 * f1 - s1) + 10 * f2 + s2)
}

/// Reverse [`pack_grid`]. Values of 32400 and above do not correspond to a
/// locator and are rejected.
pub fn unpack_grid(m: u32) -> Result<String, MessageError> {
    if m >= 32_400 {
        return Err(MessageError::GridOutOfRange { value: m });
    }
    let v = 179 - m / 180;
    let r = m % 180;
    let f1 = v / 10;
    let s1 = v % 10;
    let f2 = r / 10;
    let s2 = r % 10;
    if f1 > 17 || f2 > 17 {
        return Err(MessageError::GridOutOfRange { value: m });
    }
    Ok(format!(
        "{}{}{}{}",
        (b'A' + f1 as u8) as char,
        (b'A' + f2 as u8) as char,
        s1,
        s2
    ))
}

/// Centre of a 4- or 6-character locator as (latitude, longitude) degrees.
fn locator_center(grid: &str) -> Result<(f64, f64), GridError> {
    let up = grid.trim().to_uppercase();
    let chars: Vec<char> = up.chars().collect();
    if chars.len() != 4 && chars.len() != 6 {
        return Err(GridError::InvalidLocator { grid: grid.to_string() });
    }
    let f1 = chars[0] as i32 - 'A' as i32;
    let f2 = chars[1] as i32 - 'A' as i32;
    if !(0..18).contains(&f1) || !(0..18).contains(&f2) {
        return Err(GridError::InvalidLocator { grid: grid.to_string() });
    }
    let s1 = chars[2]
        .to_digit(10)
        .ok_or_else(|| GridError::InvalidLocator { grid: grid.to_string() })?;
    let s2 = chars[3]
        .to_digit(10)
        .ok_or_else(|| GridError::InvalidLocator { grid: grid.to_string() })?;

    let mut lon = f1 as f64 * 20.0 - 180.0 + s1 as f64 * 2.0;
    let mut lat = f2 as f64 * 10.0 - 90.0 + s2 as f64;

    if chars.len() == 6 {
        let x1 = chars[4] as i32 - 'A' as i32;
        let x2 = chars[5] as i32 - 'A' as i32;
        if !(0..24).contains(&x1) || !(0..24).contains(&x2) {
            return Err(GridError::InvalidLocator { grid: grid.to_string() });
        }
        lon += x1 as f64 * 5.0 / 60.0 + 2.5 / 60.0;
        lat += x2 as f64 * 2.5 / 60.0 + 1.25 / 60.0;
    } else {
        lon += 1.0;
        lat += 0.5;
    }
    Ok((lat, lon))
}

/// Great-circle distance between the centres of two locators, in km.
///
/// Spherical law of cosines over the mean Earth radius. Exact antipodes sit
/// on the acos branch point and are reported as [`GridError::Antipodal`].
pub fn grid_distance_km(a: &str, b: &str) -> Result<f64, GridError> {
    let (lat1, lon1) = locator_center(a)?;
    let (lat2, lon2) = locator_center(b)?;

    let (la1, la2) = (lat1.to_radians(), lat2.to_radians());
    let dlon = (lon2 - lon1).to_radians();
    let cos_c = la1.sin() * la2.sin() + la1.cos() * la2.cos() * dlon.cos();

    if cos_c <= -1.0 + 1e-12 {
        return Err(GridError::Antipodal);
    }
    let cos_c = cos_c.clamp(-1.0, 1.0);
    Ok(EARTH_RADIUS_KM * libm::acos(cos_c))
}

/// Convert latitude/longitude to a 6-character locator.
///
/// Latitude must lie strictly inside (−90, +90); longitude is normalised
/// into (−180, +180]. NaN in either coordinate is rejected.
pub fn latlon_to_grid(lat: f64, lon: f64) -> Result<String, GridError> {
    if lat.is_nan() || lon.is_nan() || lat.abs() >= 90.0 {
        return Err(GridError::LatLonOutOfRange { lat, lon });
    }
    let mut x = (lon + 180.0) % 360.0;
    if x < 0.0 {
        x += 360.0;
    }
    let y = lat + 90.0;

    let f1 = (x / 20.0).floor() as u8;
    let f2 = (y / 10.0).floor() as u8;
    let s1 = ((x % 20.0) / 2.0).floor() as u8;
    let s2 = (y % 10.0).floor() as u8;
    let x1 = ((x % 2.0) * 12.0).floor() as u8;
    let x2 = ((y % 1.0) * 24.0).floor() as u8;

    Ok(format!(
        "{}{}{}{}{}{}",
        (b'A' + f1.min(17)) as char,
        (b'A' + f2.min(17)) as char,
        s1,
        s2,
        (b'a' + x1.min(23)) as char,
        (b'a' + x2.min(23)) as char,
    ))
}

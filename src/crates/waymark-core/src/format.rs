//! Human-readable coordinate formatting.
//!
//! Degrees-minutes-seconds rendering for the waypoint surface, matching the
//! display conventions of handheld GPS units.

use crate::fix::Fix;

/// Latitude as degrees-minutes-seconds with hemisphere suffix.
pub fn latitude_dms(latitude: f64) -> String {
    let hemisphere = if latitude < 0.0 { 'S' } else { 'N' };
    dms(latitude.abs(), hemisphere)
}

/// Longitude as degrees-minutes-seconds with hemisphere suffix.
pub fn longitude_dms(longitude: f64) -> String {
    let hemisphere = if longitude < 0.0 { 'W' } else { 'E' };
    dms(longitude.abs(), hemisphere)
}

fn dms(degrees: f64, hemisphere: char) -> String {
    let whole_degrees = degrees.trunc();
    let minutes = (degrees - whole_degrees) * 60.0;
    let whole_minutes = minutes.trunc();
    let seconds = (minutes - whole_minutes) * 60.0;
    format!(
        "{}\u{00b0}{:02}'{:05.2}\"{}",
        whole_degrees as u32, whole_minutes as u32, seconds, hemisphere
    )
}

/// One-line position, latitude first.
pub fn position_line(fix: &Fix) -> String {
    format!("{} {}", latitude_dms(fix.latitude), longitude_dms(fix.longitude))
}

/// Accuracy, optional altitude and speed, and the provider name.
pub fn detail_line(fix: &Fix) -> String {
    let mut parts = vec![format!("\u{00b1}{:.0} m", fix.accuracy_m)];
    if let Some(altitude) = fix.altitude_m {
        parts.push(format!("alt {altitude:.0} m"));
    }
    if let Some(speed) = fix.speed_mps {
        parts.push(format!("{speed:.1} m/s"));
    }
    parts.push(fix.provider.clone());
    parts.join(" \u{00b7} ")
}

use bevy::prelude::*;

/// Orbit parameters `(yaw, pitch, radius)` that place a camera at
/// `translation` while looking at `focus`.
pub fn orbit_from_translation(
    translation: Vec3,
    focus: Vec3,
    axis: [Vec3; 3],
) -> (f32, f32, f32) {
    let axis = Mat3::from_cols(axis[0], axis[1], axis[2]);
    let offset = translation - focus;
    let mut radius = offset.length();
    if radius == 0.0 {
        radius = 0.05;
    }
    let offset = axis * offset;
    let yaw = offset.x.atan2(offset.z);
    let pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
    (yaw, pitch, radius)
}

/// Inverse of [`orbit_from_translation`].
pub fn translation_from_orbit(
    yaw: f32,
    pitch: f32,
    radius: f32,
    focus: Vec3,
    axis: [Vec3; 3],
) -> Vec3 {
    let rotation = Quat::from_axis_angle(axis[1], yaw) * Quat::from_axis_angle(axis[0], -pitch);
    focus + rotation * Vec3::new(0.0, 0.0, radius)
}

/// Frame-rate scaled lerp factor, saturating at 1.
pub fn ease_factor(rate: f32) -> f32 {
    rate.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AXIS: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];

    #[test]
    fn orbit_round_trips_through_translation() {
        for translation in [
            Vec3::new(0.0, 0.0, 18.0),
            Vec3::new(10.0, -5.0, 12.0),
            Vec3::new(-4.0, 3.0, 6.0),
        ] {
            let (yaw, pitch, radius) = orbit_from_translation(translation, Vec3::ZERO, AXIS);
            let back = translation_from_orbit(yaw, pitch, radius, Vec3::ZERO, AXIS);
            assert!(back.distance(translation) < 1e-3, "{back} != {translation}");
        }
    }

    #[test]
    fn zero_radius_is_nudged() {
        let (_, _, radius) = orbit_from_translation(Vec3::ONE, Vec3::ONE, AXIS);
        assert!(radius > 0.0);
    }
}

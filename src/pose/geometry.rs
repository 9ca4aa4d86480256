use crate::types::Point3;

/// Angle in degrees at vertex `b` between rays `b→a` and `b→c`, in `[0, 180]`.
///
/// Uses only the image-plane coordinates. Returns `None` if any point is missing
/// or the coordinates do not produce a finite angle; callers treat that as a
/// non-match, never as 0°.
pub fn angle_between(a: Option<&Point3>, b: Option<&Point3>, c: Option<&Point3>) -> Option<f32> {
    let (a, b, c) = (a?, b?, c?);
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let mut angle = radians.to_degrees().abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    angle.is_finite().then_some(angle.clamp(0.0, 180.0))
}

/// Exclusive range check on an angle that may be undefined.
pub fn angle_within(angle: Option<f32>, min: f32, max: f32) -> bool {
    angle.is_some_and(|a| min < a && a < max)
}

pub fn horizontal_gap(a: &Point3, b: &Point3) -> f32 {
    (a.x - b.x).abs()
}

pub fn vertical_gap(a: &Point3, b: &Point3) -> f32 {
    (a.y - b.y).abs()
}

/// Image origin is top-left, so "above" means a smaller y.
pub fn is_above(upper: &Point3, lower: &Point3) -> bool {
    upper.y < lower.y
}

pub fn distance(a: &Point3, b: &Point3) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

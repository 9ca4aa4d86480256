//! Built-in yoga postures.
//!
//! Every rule is a conjunction of three kinds of check over normalized image
//! coordinates: left/right alignment within a tolerance band, relative
//! ordering of joints (smaller y is higher in the frame) and joint-angle
//! ranges. A joint the model could not place makes its check fail.

use crate::types::{Joint, LandmarkSet, Point3};

use super::{
    geometry::{angle_between, angle_within, distance, horizontal_gap, is_above, vertical_gap},
    registry::PoseDefinition,
};

pub const ASANAS: [PoseDefinition; 21] = [
    PoseDefinition::new("Tadasana", is_tadasana),
    PoseDefinition::new("Padahastasana", is_padahastasana),
    PoseDefinition::new("Urdhva Hastasana", is_urdhva_hastasana),
    PoseDefinition::new("Vrikshasana", is_vrikshasana),
    PoseDefinition::new("Virabhadrasana I", is_virabhadrasana_one),
    PoseDefinition::new("Virabhadrasana II", is_virabhadrasana_two),
    PoseDefinition::new("Trikonasana", is_trikonasana),
    PoseDefinition::new("Utkatasana", is_utkatasana),
    PoseDefinition::new("Malasana", is_malasana),
    PoseDefinition::new("Adho Mukha Svanasana", is_adho_mukha_svanasana),
    PoseDefinition::new("Phalakasana", is_phalakasana),
    PoseDefinition::new("Bhujangasana", is_bhujangasana),
    PoseDefinition::new("Savasana", is_savasana),
    PoseDefinition::new("Setu Bandhasana", is_setu_bandhasana),
    PoseDefinition::new("Balasana", is_balasana),
    PoseDefinition::new("Dandasana", is_dandasana),
    PoseDefinition::new("Paschimottanasana", is_paschimottanasana),
    PoseDefinition::new("Navasana", is_navasana),
    PoseDefinition::new("Sukhasana", is_sukhasana),
    PoseDefinition::new("Natarajasana", is_natarajasana),
    PoseDefinition::new("Ardha Chandrasana", is_ardha_chandrasana),
];

const STRAIGHT_LIMB: f32 = 160.0;
const WIDE_STANCE: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    const BOTH: [Side; 2] = [Side::Left, Side::Right];

    fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    fn pick(self, left: Joint, right: Joint) -> Joint {
        match self {
            Side::Left => left,
            Side::Right => right,
        }
    }

    fn shoulder(self) -> Joint {
        self.pick(Joint::LeftShoulder, Joint::RightShoulder)
    }

    fn elbow(self) -> Joint {
        self.pick(Joint::LeftElbow, Joint::RightElbow)
    }

    fn wrist(self) -> Joint {
        self.pick(Joint::LeftWrist, Joint::RightWrist)
    }

    fn hip(self) -> Joint {
        self.pick(Joint::LeftHip, Joint::RightHip)
    }

    fn knee(self) -> Joint {
        self.pick(Joint::LeftKnee, Joint::RightKnee)
    }

    fn ankle(self) -> Joint {
        self.pick(Joint::LeftAnkle, Joint::RightAnkle)
    }
}

/// Read-only view over one landmark set with the checks the rules share.
#[derive(Clone, Copy)]
struct Body<'a> {
    landmarks: &'a LandmarkSet,
}

impl<'a> Body<'a> {
    fn new(landmarks: &'a LandmarkSet) -> Self {
        Self { landmarks }
    }

    fn at(&self, joint: Joint) -> Option<&'a Point3> {
        self.landmarks.joint(joint)
    }

    fn angle(&self, a: Joint, b: Joint, c: Joint) -> Option<f32> {
        angle_between(self.at(a), self.at(b), self.at(c))
    }

    fn angle_in(&self, a: Joint, b: Joint, c: Joint, min: f32, max: f32) -> bool {
        angle_within(self.angle(a, b, c), min, max)
    }

    fn pair(&self, a: Joint, b: Joint, check: impl Fn(&Point3, &Point3) -> bool) -> bool {
        match (self.at(a), self.at(b)) {
            (Some(a), Some(b)) => check(a, b),
            _ => false,
        }
    }

    /// Same column within `tolerance`.
    fn aligned_x(&self, a: Joint, b: Joint, tolerance: f32) -> bool {
        self.pair(a, b, |a, b| horizontal_gap(a, b) < tolerance)
    }

    /// Same row within `tolerance`.
    fn aligned_y(&self, a: Joint, b: Joint, tolerance: f32) -> bool {
        self.pair(a, b, |a, b| vertical_gap(a, b) < tolerance)
    }

    fn above(&self, upper: Joint, lower: Joint) -> bool {
        self.pair(upper, lower, is_above)
    }

    /// `upper` is higher than `lower` by more than `margin`.
    fn above_by(&self, upper: Joint, lower: Joint, margin: f32) -> bool {
        self.pair(upper, lower, |u, l| l.y - u.y > margin)
    }

    fn apart_x(&self, a: Joint, b: Joint, min_gap: f32) -> bool {
        self.pair(a, b, |a, b| horizontal_gap(a, b) > min_gap)
    }

    fn near(&self, a: Joint, b: Joint, max_distance: f32) -> bool {
        self.pair(a, b, |a, b| distance(a, b) < max_distance)
    }

    fn knee_angle(&self, side: Side) -> Option<f32> {
        self.angle(side.hip(), side.knee(), side.ankle())
    }

    fn hip_angle(&self, side: Side) -> Option<f32> {
        self.angle(side.shoulder(), side.hip(), side.knee())
    }

    fn elbow_angle(&self, side: Side) -> Option<f32> {
        self.angle(side.shoulder(), side.elbow(), side.wrist())
    }

    fn leg_straight(&self, side: Side) -> bool {
        angle_within(self.knee_angle(side), STRAIGHT_LIMB, 200.0)
    }

    fn legs_straight(&self) -> bool {
        Side::BOTH.iter().all(|&s| self.leg_straight(s))
    }

    fn wide_stance(&self, min_gap: f32) -> bool {
        self.apart_x(Joint::LeftAnkle, Joint::RightAnkle, min_gap)
    }

    /// Shoulders over hips with the torso closer to vertical than horizontal.
    /// Holds at any distance from the camera.
    fn torso_upright(&self) -> bool {
        Side::BOTH.iter().all(|&s| {
            self.pair(s.shoulder(), s.hip(), |shoulder, hip| {
                is_above(shoulder, hip)
                    && vertical_gap(shoulder, hip) > horizontal_gap(shoulder, hip)
            })
        })
    }

    fn wrists_overhead(&self) -> bool {
        Side::BOTH
            .iter()
            .all(|&s| self.above(s.wrist(), Joint::Nose))
    }

    /// Shoulders, hips and ankles lie on one row.
    fn lying_flat(&self, tolerance: f32) -> bool {
        Side::BOTH.iter().all(|&s| {
            self.aligned_y(s.shoulder(), s.hip(), tolerance)
                && self.aligned_y(s.hip(), s.ankle(), tolerance)
        })
    }

    /// Legs extended along the floor while sitting.
    fn legs_along_floor(&self) -> bool {
        Side::BOTH
            .iter()
            .all(|&s| self.aligned_y(s.hip(), s.ankle(), 0.1) && self.leg_straight(s))
    }
}

fn is_tadasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    let symmetric = [
        (Joint::LeftAnkle, Joint::RightAnkle),
        (Joint::LeftKnee, Joint::RightKnee),
        (Joint::LeftHip, Joint::RightHip),
        (Joint::LeftShoulder, Joint::RightShoulder),
    ]
    .iter()
    .all(|&(l, r)| body.aligned_x(l, r, 0.1));

    symmetric
        && Side::BOTH
            .iter()
            .all(|&s| body.above(s.knee(), s.ankle()) && body.above(s.hip(), s.knee()))
        && body.angle_in(
            Joint::LeftShoulder,
            Joint::LeftHip,
            Joint::LeftKnee,
            160.0,
            200.0,
        )
}

fn is_padahastasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    Side::BOTH.iter().all(|&s| {
        // Legs straight down, shoulders folded past the knees but still above the feet.
        body.above(s.knee(), s.ankle())
            && body.above(s.knee(), s.shoulder())
            && body.above(s.shoulder(), s.ankle())
    })
}

fn is_urdhva_hastasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.aligned_x(Joint::LeftAnkle, Joint::RightAnkle, 0.12)
        && body.legs_straight()
        && body.torso_upright()
        && body.wrists_overhead()
        && Side::BOTH
            .iter()
            .all(|&s| body.above(s.elbow(), s.shoulder()))
}

fn is_vrikshasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.torso_upright()
        && Side::BOTH.iter().any(|&lifted| {
            let standing = lifted.other();
            body.leg_straight(standing)
                && angle_within(body.knee_angle(lifted), 0.0, 120.0)
                && body.above_by(lifted.ankle(), standing.ankle(), 0.1)
                && !body.above(lifted.ankle(), lifted.knee())
                && body.aligned_x(lifted.ankle(), standing.knee(), 0.1)
        })
}

fn lunge(body: &Body<'_>, front: Side) -> bool {
    angle_within(body.knee_angle(front), 80.0, 130.0) && body.leg_straight(front.other())
}

fn is_virabhadrasana_one(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.wide_stance(0.25)
        && body.wrists_overhead()
        && Side::BOTH.iter().any(|&front| lunge(&body, front))
}

fn is_virabhadrasana_two(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    let arms_level = Side::BOTH.iter().all(|&s| {
        body.aligned_y(s.wrist(), s.shoulder(), 0.1)
            && angle_within(body.elbow_angle(s), STRAIGHT_LIMB, 200.0)
    });
    arms_level
        && body.apart_x(Joint::LeftWrist, Joint::RightWrist, 0.4)
        && body.wide_stance(WIDE_STANCE)
        && Side::BOTH.iter().any(|&front| lunge(&body, front))
}

fn is_trikonasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.wide_stance(WIDE_STANCE)
        && body.legs_straight()
        && body.aligned_x(Joint::LeftWrist, Joint::RightWrist, 0.15)
        && Side::BOTH.iter().any(|&low| {
            let high = low.other();
            body.above(low.knee(), low.wrist()) && body.above(high.wrist(), high.shoulder())
        })
}

fn is_utkatasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.aligned_x(Joint::LeftAnkle, Joint::RightAnkle, 0.15)
        && body.wrists_overhead()
        && Side::BOTH.iter().all(|&s| {
            angle_within(body.knee_angle(s), 90.0, 150.0) && body.above(s.hip(), s.knee())
        })
}

fn is_malasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.near(Joint::LeftWrist, Joint::RightWrist, 0.1)
        && body.torso_upright()
        && Side::BOTH.iter().all(|&s| {
            angle_within(body.knee_angle(s), 0.0, 70.0) && !body.above_by(s.hip(), s.knee(), 0.05)
        })
}

fn is_adho_mukha_svanasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    Side::BOTH.iter().all(|&s| {
        body.above(s.hip(), s.shoulder())
            && body.above(s.hip(), s.ankle())
            && body.above(s.shoulder(), s.wrist())
            && body.angle_in(s.shoulder(), s.hip(), s.ankle(), 40.0, 110.0)
            && body.angle_in(s.hip(), s.knee(), s.ankle(), 150.0, 200.0)
            && angle_within(body.elbow_angle(s), 150.0, 200.0)
    })
}

fn is_phalakasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    Side::BOTH.iter().all(|&s| {
        body.aligned_y(s.shoulder(), s.hip(), 0.1)
            && body.aligned_y(s.hip(), s.ankle(), 0.15)
            && body.angle_in(s.shoulder(), s.hip(), s.ankle(), STRAIGHT_LIMB, 200.0)
            && angle_within(body.elbow_angle(s), 150.0, 200.0)
            && body.above_by(s.shoulder(), s.wrist(), 0.1)
            && body.aligned_x(s.wrist(), s.shoulder(), 0.1)
    })
}

fn is_bhujangasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    Side::BOTH.iter().all(|&s| {
        body.aligned_y(s.hip(), s.ankle(), 0.1)
            && body.above_by(s.shoulder(), s.hip(), 0.1)
            && body.above(s.shoulder(), s.wrist())
            && body.angle_in(s.shoulder(), s.hip(), s.knee(), 100.0, STRAIGHT_LIMB)
            && angle_within(body.knee_angle(s), 150.0, 200.0)
    })
}

fn is_savasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.lying_flat(0.08)
        && body.aligned_y(Joint::Nose, Joint::LeftHip, 0.1)
        && body.apart_x(Joint::LeftShoulder, Joint::LeftAnkle, 0.3)
        && body.legs_straight()
        && Side::BOTH
            .iter()
            .all(|&s| body.aligned_y(s.wrist(), s.hip(), 0.1))
}

fn is_setu_bandhasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    Side::BOTH.iter().all(|&s| {
        body.above_by(s.hip(), s.shoulder(), 0.05)
            && body.above_by(s.hip(), s.ankle(), 0.05)
            && body.above(s.knee(), s.hip())
            && body.aligned_y(s.shoulder(), s.ankle(), 0.1)
            && angle_within(body.knee_angle(s), 60.0, 120.0)
    })
}

fn is_balasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.above(Joint::LeftHip, Joint::Nose)
        && Side::BOTH.iter().all(|&s| {
            angle_within(body.knee_angle(s), 0.0, 60.0)
                && angle_within(body.hip_angle(s), 0.0, 60.0)
                && body.above(s.hip(), s.shoulder())
        })
}

fn is_dandasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.legs_along_floor()
        && body.torso_upright()
        && Side::BOTH.iter().all(|&s| {
            body.aligned_x(s.shoulder(), s.hip(), 0.1)
                && angle_within(body.hip_angle(s), 70.0, 110.0)
        })
}

fn is_paschimottanasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.legs_along_floor()
        && Side::BOTH
            .iter()
            .all(|&s| angle_within(body.hip_angle(s), 0.0, 60.0))
}

fn is_navasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    Side::BOTH.iter().all(|&s| {
        angle_within(body.hip_angle(s), 50.0, 110.0)
            && angle_within(body.knee_angle(s), 140.0, 200.0)
            && body.above_by(s.ankle(), s.hip(), 0.1)
            && body.above_by(s.shoulder(), s.hip(), 0.1)
    })
}

fn is_sukhasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    let (Some(left_knee), Some(right_knee)) = (
        body.at(Joint::LeftKnee),
        body.at(Joint::RightKnee),
    ) else {
        return false;
    };
    let (min_x, max_x) = (left_knee.x.min(right_knee.x), left_knee.x.max(right_knee.x));
    let ankles_tucked = Side::BOTH.iter().all(|&s| {
        body.at(s.ankle())
            .is_some_and(|ankle| min_x < ankle.x && ankle.x < max_x)
    });

    ankles_tucked
        && body.torso_upright()
        && Side::BOTH.iter().all(|&s| {
            body.aligned_y(s.knee(), s.hip(), 0.1) && angle_within(body.knee_angle(s), 0.0, 60.0)
        })
}

fn is_natarajasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    Side::BOTH.iter().any(|&lifted| {
        let standing = lifted.other();
        body.leg_straight(standing)
            && body.above(lifted.ankle(), lifted.knee())
            && angle_within(body.knee_angle(lifted), 0.0, 100.0)
            && body.above(standing.shoulder(), standing.hip())
            && Side::BOTH
                .iter()
                .any(|&arm| !body.above_by(arm.shoulder(), arm.wrist(), 0.05))
    })
}

fn is_ardha_chandrasana(landmarks: &LandmarkSet) -> bool {
    let body = Body::new(landmarks);
    body.aligned_x(Joint::LeftWrist, Joint::RightWrist, 0.15)
        && Side::BOTH.iter().any(|&lifted| {
            let standing = lifted.other();
            body.leg_straight(standing)
                && body.leg_straight(lifted)
                && body.aligned_y(lifted.ankle(), lifted.hip(), 0.1)
                && body.aligned_y(standing.shoulder(), standing.hip(), 0.12)
                && Side::BOTH.iter().any(|&up| {
                    body.above_by(up.wrist(), up.shoulder(), 0.1)
                        && body.above(up.other().shoulder(), up.other().wrist())
                })
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pose::registry::PoseRegistry;

    /// Builds a set with every joint at the centre, then moves the listed ones.
    pub(crate) fn body(placements: &[(Joint, f32, f32)]) -> LandmarkSet {
        LandmarkSet::from_fn(|joint| {
            placements
                .iter()
                .find(|(j, _, _)| *j == joint)
                .map(|&(_, x, y)| Point3::new(x, y, 0.0, 0.99))
                .unwrap_or(Point3::new(0.5, 0.5, 0.0, 0.99))
        })
    }

    /// Front-facing, feet together, arms by the sides.
    pub(crate) fn standing() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.50, 0.10),
            (Joint::LeftShoulder, 0.46, 0.25),
            (Joint::RightShoulder, 0.54, 0.25),
            (Joint::LeftElbow, 0.44, 0.38),
            (Joint::RightElbow, 0.56, 0.38),
            (Joint::LeftWrist, 0.44, 0.50),
            (Joint::RightWrist, 0.56, 0.50),
            (Joint::LeftHip, 0.47, 0.55),
            (Joint::RightHip, 0.53, 0.55),
            (Joint::LeftKnee, 0.47, 0.72),
            (Joint::RightKnee, 0.53, 0.72),
            (Joint::LeftAnkle, 0.47, 0.90),
            (Joint::RightAnkle, 0.53, 0.90),
        ])
    }

    /// Side view, body horizontal, arms straight under the shoulders.
    fn plank() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.22, 0.48),
            (Joint::LeftShoulder, 0.30, 0.50),
            (Joint::RightShoulder, 0.30, 0.50),
            (Joint::LeftElbow, 0.30, 0.58),
            (Joint::RightElbow, 0.30, 0.58),
            (Joint::LeftWrist, 0.30, 0.66),
            (Joint::RightWrist, 0.30, 0.66),
            (Joint::LeftHip, 0.55, 0.52),
            (Joint::RightHip, 0.55, 0.52),
            (Joint::LeftKnee, 0.70, 0.535),
            (Joint::RightKnee, 0.70, 0.535),
            (Joint::LeftAnkle, 0.85, 0.55),
            (Joint::RightAnkle, 0.85, 0.55),
        ])
    }

    /// Side view, lying on the back with arms alongside the body.
    fn lying() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.20, 0.70),
            (Joint::LeftShoulder, 0.30, 0.70),
            (Joint::RightShoulder, 0.30, 0.70),
            (Joint::LeftElbow, 0.38, 0.71),
            (Joint::RightElbow, 0.38, 0.71),
            (Joint::LeftWrist, 0.46, 0.71),
            (Joint::RightWrist, 0.46, 0.71),
            (Joint::LeftHip, 0.55, 0.71),
            (Joint::RightHip, 0.55, 0.71),
            (Joint::LeftKnee, 0.70, 0.71),
            (Joint::RightKnee, 0.70, 0.71),
            (Joint::LeftAnkle, 0.85, 0.72),
            (Joint::RightAnkle, 0.85, 0.72),
        ])
    }

    /// Standing forward fold, shoulders hanging below the knees.
    fn forward_fold() -> LandmarkSet {
        body(&[
            (Joint::LeftShoulder, 0.55, 0.78),
            (Joint::RightShoulder, 0.55, 0.78),
            (Joint::LeftHip, 0.48, 0.52),
            (Joint::RightHip, 0.48, 0.52),
            (Joint::LeftKnee, 0.50, 0.72),
            (Joint::RightKnee, 0.50, 0.72),
            (Joint::LeftAnkle, 0.50, 0.90),
            (Joint::RightAnkle, 0.50, 0.90),
        ])
    }

    /// Upright and far from the camera, the whole body spanning a quarter of the frame.
    fn distant_standing() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.50, 0.40),
            (Joint::LeftShoulder, 0.48, 0.45),
            (Joint::RightShoulder, 0.52, 0.45),
            (Joint::LeftElbow, 0.475, 0.50),
            (Joint::RightElbow, 0.525, 0.50),
            (Joint::LeftWrist, 0.475, 0.55),
            (Joint::RightWrist, 0.525, 0.55),
            (Joint::LeftHip, 0.49, 0.55),
            (Joint::RightHip, 0.51, 0.55),
            (Joint::LeftKnee, 0.49, 0.62),
            (Joint::RightKnee, 0.51, 0.62),
            (Joint::LeftAnkle, 0.49, 0.70),
            (Joint::RightAnkle, 0.51, 0.70),
        ])
    }

    /// Balanced on the right leg, left sole against the right knee, palms together.
    fn tree() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.50, 0.10),
            (Joint::LeftShoulder, 0.46, 0.25),
            (Joint::RightShoulder, 0.54, 0.25),
            (Joint::LeftElbow, 0.40, 0.38),
            (Joint::RightElbow, 0.60, 0.38),
            (Joint::LeftWrist, 0.49, 0.36),
            (Joint::RightWrist, 0.51, 0.36),
            (Joint::LeftHip, 0.47, 0.55),
            (Joint::RightHip, 0.53, 0.55),
            (Joint::LeftKnee, 0.38, 0.66),
            (Joint::RightKnee, 0.53, 0.72),
            (Joint::LeftAnkle, 0.51, 0.72),
            (Joint::RightAnkle, 0.53, 0.90),
        ])
    }

    /// Left knee bent over the ankle, right leg straight back, arms overhead.
    fn warrior_one() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.50, 0.15),
            (Joint::LeftShoulder, 0.46, 0.28),
            (Joint::RightShoulder, 0.54, 0.28),
            (Joint::LeftElbow, 0.47, 0.16),
            (Joint::RightElbow, 0.53, 0.16),
            (Joint::LeftWrist, 0.48, 0.05),
            (Joint::RightWrist, 0.52, 0.05),
            (Joint::LeftHip, 0.48, 0.55),
            (Joint::RightHip, 0.52, 0.55),
            (Joint::LeftKnee, 0.30, 0.65),
            (Joint::RightKnee, 0.62, 0.72),
            (Joint::LeftAnkle, 0.30, 0.90),
            (Joint::RightAnkle, 0.72, 0.89),
        ])
    }

    /// Warrior lunge with both arms held level, reaching wide.
    fn warrior_two() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.50, 0.18),
            (Joint::LeftShoulder, 0.45, 0.30),
            (Joint::RightShoulder, 0.55, 0.30),
            (Joint::LeftElbow, 0.32, 0.30),
            (Joint::RightElbow, 0.68, 0.30),
            (Joint::LeftWrist, 0.20, 0.30),
            (Joint::RightWrist, 0.80, 0.30),
            (Joint::LeftHip, 0.48, 0.55),
            (Joint::RightHip, 0.52, 0.55),
            (Joint::LeftKnee, 0.30, 0.65),
            (Joint::RightKnee, 0.62, 0.72),
            (Joint::LeftAnkle, 0.30, 0.90),
            (Joint::RightAnkle, 0.72, 0.89),
        ])
    }

    /// Straight legs wide apart, left hand down by the shin, right hand up.
    fn triangle() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.33, 0.40),
            (Joint::LeftShoulder, 0.30, 0.45),
            (Joint::RightShoulder, 0.32, 0.35),
            (Joint::LeftElbow, 0.27, 0.62),
            (Joint::RightElbow, 0.31, 0.22),
            (Joint::LeftWrist, 0.25, 0.80),
            (Joint::RightWrist, 0.30, 0.10),
            (Joint::LeftHip, 0.45, 0.55),
            (Joint::RightHip, 0.50, 0.55),
            (Joint::LeftKnee, 0.35, 0.72),
            (Joint::RightKnee, 0.60, 0.72),
            (Joint::LeftAnkle, 0.25, 0.89),
            (Joint::RightAnkle, 0.70, 0.89),
        ])
    }

    /// Side view, knees bent and hips back, arms reaching up.
    fn chair() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.52, 0.25),
            (Joint::LeftShoulder, 0.48, 0.35),
            (Joint::RightShoulder, 0.48, 0.35),
            (Joint::LeftElbow, 0.54, 0.20),
            (Joint::RightElbow, 0.54, 0.20),
            (Joint::LeftWrist, 0.60, 0.05),
            (Joint::RightWrist, 0.60, 0.05),
            (Joint::LeftHip, 0.40, 0.60),
            (Joint::RightHip, 0.40, 0.60),
            (Joint::LeftKnee, 0.55, 0.70),
            (Joint::RightKnee, 0.55, 0.70),
            (Joint::LeftAnkle, 0.50, 0.90),
            (Joint::RightAnkle, 0.50, 0.90),
        ])
    }

    /// Deep front-facing squat, palms together at the chest.
    fn garland() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.50, 0.30),
            (Joint::LeftShoulder, 0.45, 0.40),
            (Joint::RightShoulder, 0.55, 0.40),
            (Joint::LeftElbow, 0.42, 0.50),
            (Joint::RightElbow, 0.58, 0.50),
            (Joint::LeftWrist, 0.49, 0.50),
            (Joint::RightWrist, 0.51, 0.50),
            (Joint::LeftHip, 0.45, 0.65),
            (Joint::RightHip, 0.55, 0.65),
            (Joint::LeftKnee, 0.35, 0.62),
            (Joint::RightKnee, 0.65, 0.62),
            (Joint::LeftAnkle, 0.42, 0.85),
            (Joint::RightAnkle, 0.58, 0.85),
        ])
    }

    /// Side view, hips high, arms and legs straight.
    fn downward_dog() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.28, 0.72),
            (Joint::LeftShoulder, 0.32, 0.65),
            (Joint::RightShoulder, 0.32, 0.65),
            (Joint::LeftElbow, 0.26, 0.75),
            (Joint::RightElbow, 0.26, 0.75),
            (Joint::LeftWrist, 0.20, 0.85),
            (Joint::RightWrist, 0.20, 0.85),
            (Joint::LeftHip, 0.55, 0.35),
            (Joint::RightHip, 0.55, 0.35),
            (Joint::LeftKnee, 0.65, 0.60),
            (Joint::RightKnee, 0.65, 0.60),
            (Joint::LeftAnkle, 0.75, 0.85),
            (Joint::RightAnkle, 0.75, 0.85),
        ])
    }

    /// Side view, legs on the floor, chest lifted on the hands.
    fn cobra() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.30, 0.55),
            (Joint::LeftShoulder, 0.35, 0.62),
            (Joint::RightShoulder, 0.35, 0.62),
            (Joint::LeftElbow, 0.37, 0.71),
            (Joint::RightElbow, 0.37, 0.71),
            (Joint::LeftWrist, 0.38, 0.80),
            (Joint::RightWrist, 0.38, 0.80),
            (Joint::LeftHip, 0.55, 0.80),
            (Joint::RightHip, 0.55, 0.80),
            (Joint::LeftKnee, 0.70, 0.80),
            (Joint::RightKnee, 0.70, 0.80),
            (Joint::LeftAnkle, 0.85, 0.80),
            (Joint::RightAnkle, 0.85, 0.80),
        ])
    }

    /// Side view, shoulders and feet down, hips lifted, knees bent.
    fn bridge() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.18, 0.82),
            (Joint::LeftShoulder, 0.25, 0.82),
            (Joint::RightShoulder, 0.25, 0.82),
            (Joint::LeftElbow, 0.30, 0.82),
            (Joint::RightElbow, 0.30, 0.82),
            (Joint::LeftWrist, 0.35, 0.82),
            (Joint::RightWrist, 0.35, 0.82),
            (Joint::LeftHip, 0.50, 0.65),
            (Joint::RightHip, 0.50, 0.65),
            (Joint::LeftKnee, 0.65, 0.55),
            (Joint::RightKnee, 0.65, 0.55),
            (Joint::LeftAnkle, 0.70, 0.80),
            (Joint::RightAnkle, 0.70, 0.80),
        ])
    }

    /// Side view, sitting on the heels, forehead towards the floor.
    fn child() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.25, 0.82),
            (Joint::LeftShoulder, 0.35, 0.78),
            (Joint::RightShoulder, 0.35, 0.78),
            (Joint::LeftElbow, 0.24, 0.84),
            (Joint::RightElbow, 0.24, 0.84),
            (Joint::LeftWrist, 0.12, 0.85),
            (Joint::RightWrist, 0.12, 0.85),
            (Joint::LeftHip, 0.60, 0.70),
            (Joint::RightHip, 0.60, 0.70),
            (Joint::LeftKnee, 0.45, 0.82),
            (Joint::RightKnee, 0.45, 0.82),
            (Joint::LeftAnkle, 0.65, 0.86),
            (Joint::RightAnkle, 0.65, 0.86),
        ])
    }

    /// Side view, seated upright with legs straight out.
    fn staff() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.38, 0.35),
            (Joint::LeftShoulder, 0.40, 0.45),
            (Joint::RightShoulder, 0.40, 0.45),
            (Joint::LeftElbow, 0.40, 0.60),
            (Joint::RightElbow, 0.40, 0.60),
            (Joint::LeftWrist, 0.40, 0.74),
            (Joint::RightWrist, 0.40, 0.74),
            (Joint::LeftHip, 0.42, 0.75),
            (Joint::RightHip, 0.42, 0.75),
            (Joint::LeftKnee, 0.60, 0.76),
            (Joint::RightKnee, 0.60, 0.76),
            (Joint::LeftAnkle, 0.80, 0.77),
            (Joint::RightAnkle, 0.80, 0.77),
        ])
    }

    /// Side view, seated with the chest folded over straight legs.
    fn seated_fold() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.72, 0.66),
            (Joint::LeftShoulder, 0.65, 0.68),
            (Joint::RightShoulder, 0.65, 0.68),
            (Joint::LeftElbow, 0.72, 0.72),
            (Joint::RightElbow, 0.72, 0.72),
            (Joint::LeftWrist, 0.80, 0.76),
            (Joint::RightWrist, 0.80, 0.76),
            (Joint::LeftHip, 0.42, 0.75),
            (Joint::RightHip, 0.42, 0.75),
            (Joint::LeftKnee, 0.60, 0.76),
            (Joint::RightKnee, 0.60, 0.76),
            (Joint::LeftAnkle, 0.80, 0.77),
            (Joint::RightAnkle, 0.80, 0.77),
        ])
    }

    /// Side view, balanced on the sit bones, legs and chest lifted.
    fn boat() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.32, 0.40),
            (Joint::LeftShoulder, 0.35, 0.50),
            (Joint::RightShoulder, 0.35, 0.50),
            (Joint::LeftElbow, 0.45, 0.52),
            (Joint::RightElbow, 0.45, 0.52),
            (Joint::LeftWrist, 0.55, 0.54),
            (Joint::RightWrist, 0.55, 0.54),
            (Joint::LeftHip, 0.50, 0.75),
            (Joint::RightHip, 0.50, 0.75),
            (Joint::LeftKnee, 0.65, 0.55),
            (Joint::RightKnee, 0.65, 0.55),
            (Joint::LeftAnkle, 0.75, 0.42),
            (Joint::RightAnkle, 0.75, 0.42),
        ])
    }

    /// Front view, seated with shins crossed and ankles tucked in.
    fn cross_legged() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.50, 0.25),
            (Joint::LeftShoulder, 0.42, 0.40),
            (Joint::RightShoulder, 0.58, 0.40),
            (Joint::LeftElbow, 0.38, 0.55),
            (Joint::RightElbow, 0.62, 0.55),
            (Joint::LeftWrist, 0.34, 0.68),
            (Joint::RightWrist, 0.66, 0.68),
            (Joint::LeftHip, 0.44, 0.68),
            (Joint::RightHip, 0.56, 0.68),
            (Joint::LeftKnee, 0.30, 0.72),
            (Joint::RightKnee, 0.70, 0.72),
            (Joint::LeftAnkle, 0.55, 0.74),
            (Joint::RightAnkle, 0.45, 0.74),
        ])
    }

    /// Standing on the right leg, left foot kicked up behind, left arm forward.
    fn dancer() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.44, 0.20),
            (Joint::LeftShoulder, 0.48, 0.28),
            (Joint::RightShoulder, 0.48, 0.28),
            (Joint::LeftElbow, 0.38, 0.24),
            (Joint::RightElbow, 0.55, 0.40),
            (Joint::LeftWrist, 0.30, 0.20),
            (Joint::RightWrist, 0.66, 0.43),
            (Joint::LeftHip, 0.50, 0.55),
            (Joint::RightHip, 0.50, 0.55),
            (Joint::LeftKnee, 0.62, 0.62),
            (Joint::RightKnee, 0.50, 0.72),
            (Joint::LeftAnkle, 0.70, 0.45),
            (Joint::RightAnkle, 0.50, 0.90),
        ])
    }

    /// Standing on the right leg, left leg level with the hip, arms in one vertical line.
    fn half_moon() -> LandmarkSet {
        body(&[
            (Joint::Nose, 0.22, 0.58),
            (Joint::LeftShoulder, 0.30, 0.58),
            (Joint::RightShoulder, 0.30, 0.60),
            (Joint::LeftElbow, 0.30, 0.44),
            (Joint::RightElbow, 0.31, 0.74),
            (Joint::LeftWrist, 0.31, 0.30),
            (Joint::RightWrist, 0.31, 0.88),
            (Joint::LeftHip, 0.50, 0.55),
            (Joint::RightHip, 0.50, 0.55),
            (Joint::LeftKnee, 0.64, 0.56),
            (Joint::RightKnee, 0.50, 0.72),
            (Joint::LeftAnkle, 0.78, 0.57),
            (Joint::RightAnkle, 0.50, 0.90),
        ])
    }

    fn unplaced(landmarks: &LandmarkSet, missing: Joint) -> LandmarkSet {
        LandmarkSet::from_fn(|joint| {
            if joint == missing {
                Point3::new(f32::NAN, f32::NAN, 0.0, 0.99)
            } else {
                *landmarks.point(joint)
            }
        })
    }

    fn names(landmarks: &LandmarkSet) -> Vec<&'static str> {
        PoseRegistry::builtin()
            .classify(Some(landmarks))
            .names()
            .to_vec()
    }

    #[test]
    fn standing_is_tadasana_and_not_a_forward_bend() {
        let landmarks = standing();
        assert!(is_tadasana(&landmarks));
        assert!(!is_padahastasana(&landmarks));
        assert!(!is_paschimottanasana(&landmarks));
        assert!(!is_adho_mukha_svanasana(&landmarks));
    }

    #[test]
    fn standing_matches_tadasana_alone() {
        assert_eq!(names(&standing()), ["Tadasana"]);
    }

    #[test]
    fn standing_far_from_the_camera_is_still_tadasana() {
        assert_eq!(names(&distant_standing()), ["Tadasana"]);
    }

    #[test]
    fn arms_overhead_adds_upward_salute() {
        let raised = [
            (Joint::LeftElbow, 0.45, 0.15),
            (Joint::RightElbow, 0.55, 0.15),
            (Joint::LeftWrist, 0.46, 0.04),
            (Joint::RightWrist, 0.54, 0.04),
        ];
        let mut placements: Vec<_> = standing()
            .iter()
            .filter(|(joint, _)| !raised.iter().any(|(r, _, _)| r == joint))
            .map(|(joint, p)| (joint, p.x, p.y))
            .collect();
        placements.extend(raised);
        let landmarks = body(&placements);

        let result = PoseRegistry::builtin().classify(Some(&landmarks));
        assert!(result.contains("Tadasana"));
        assert!(result.contains("Urdhva Hastasana"));
    }

    #[test]
    fn forward_fold_is_padahastasana() {
        let landmarks = forward_fold();
        assert!(is_padahastasana(&landmarks));
        assert!(!is_tadasana(&landmarks));
    }

    #[test]
    fn plank_is_not_lying_down() {
        let landmarks = plank();
        assert!(is_phalakasana(&landmarks));
        assert!(!is_savasana(&landmarks));
    }

    #[test]
    fn lying_is_savasana_not_plank() {
        let landmarks = lying();
        assert!(is_savasana(&landmarks));
        assert!(!is_phalakasana(&landmarks));
        assert!(!is_setu_bandhasana(&landmarks));
    }

    #[test]
    fn each_posture_is_recognised() {
        let cases: [(&str, LandmarkSet, &[&str]); 16] = [
            ("tree", tree(), &["Vrikshasana"]),
            ("warrior one", warrior_one(), &["Virabhadrasana I"]),
            ("warrior two", warrior_two(), &["Virabhadrasana II"]),
            ("triangle", triangle(), &["Trikonasana"]),
            ("chair", chair(), &["Utkatasana"]),
            // A deep squat with tucked ankles also reads as cross-legged.
            ("garland", garland(), &["Malasana", "Sukhasana"]),
            // Shoulders below the knees and above the feet, as in a standing fold.
            ("downward dog", downward_dog(), &["Padahastasana", "Adho Mukha Svanasana"]),
            ("cobra", cobra(), &["Bhujangasana"]),
            ("bridge", bridge(), &["Setu Bandhasana"]),
            ("child", child(), &["Balasana"]),
            ("staff", staff(), &["Dandasana"]),
            ("seated fold", seated_fold(), &["Paschimottanasana"]),
            ("boat", boat(), &["Navasana"]),
            ("cross-legged", cross_legged(), &["Sukhasana"]),
            ("dancer", dancer(), &["Natarajasana"]),
            ("half moon", half_moon(), &["Ardha Chandrasana"]),
        ];
        for (label, landmarks, expected) in cases {
            assert_eq!(names(&landmarks), expected, "{label}");
        }
    }

    #[test]
    fn no_placeable_joint_matches_nothing() {
        let landmarks = LandmarkSet::from_fn(|_| Point3::new(f32::NAN, f32::NAN, f32::NAN, 0.99));
        assert!(PoseRegistry::builtin().classify(Some(&landmarks)).is_empty());
    }

    #[test]
    fn unplaced_hip_fails_every_rule_that_reads_it() {
        let landmarks = unplaced(&standing(), Joint::LeftHip);
        assert!(!is_tadasana(&landmarks));
        assert!(names(&landmarks).is_empty());

        // Padahastasana is the only rule that never looks at the hips.
        let postures = [
            plank(),
            lying(),
            forward_fold(),
            distant_standing(),
            tree(),
            warrior_one(),
            warrior_two(),
            triangle(),
            chair(),
            garland(),
            downward_dog(),
            cobra(),
            bridge(),
            child(),
            staff(),
            seated_fold(),
            boat(),
            cross_legged(),
            dancer(),
            half_moon(),
        ];
        for posture in postures {
            let matched = names(&unplaced(&posture, Joint::LeftHip));
            assert!(matched.iter().all(|name| *name == "Padahastasana"), "{matched:?}");
        }
    }
}

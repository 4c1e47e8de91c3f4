use crate::config::{CAP_OPACITY, FALLOFF_EXPONENT, SPARKLE_BOOST, SPARKLE_CHANCE};
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Influence {
    pub(crate) linear: f32,
    pub(crate) shaped: f32, // drives glow size
    pub(crate) opacity: f32, // capped
}

pub(crate) fn score(
    cell_x: f32,
    cell_y: f32,
    pointer_x: f32,
    pointer_y: f32,
    radius: f32,
    sparkle: f32,
) -> Influence {
    let dx = cell_x - pointer_x;
    let dy = cell_y - pointer_y;
    let d = (dx * dx + dy * dy).sqrt();

    let linear = if radius > 0.0 {
        (1.0 - d / radius).max(0.0)
    } else {
        0.0
    };
    let shaped = linear.powf(FALLOFF_EXPONENT);
    let opacity = (shaped + sparkle.max(0.0)).min(CAP_OPACITY);

    Influence {
        linear,
        shaped,
        opacity,
    }
}

pub(crate) fn roll_sparkle<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    if rng.gen::<f64>() < SPARKLE_CHANCE {
        SPARKLE_BOOST
    } else {
        0.0
    }
}

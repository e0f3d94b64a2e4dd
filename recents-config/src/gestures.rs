use crate::FloatOrInt;

/// Touch thresholds. Distances are in dp, velocities in dp per second.
#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq)]
pub struct Gestures {
    #[knuffel(child, unwrap(argument), default = FloatOrInt(8.))]
    pub touch_slop: FloatOrInt<0, 1000>,
    #[knuffel(child, unwrap(argument), default = FloatOrInt(1500.))]
    pub min_fling_velocity: FloatOrInt<0, 100000>,
    #[knuffel(child, unwrap(argument), default = FloatOrInt(500.))]
    pub fling_threshold_velocity: FloatOrInt<0, 100000>,
    #[knuffel(child, unwrap(argument), default = 400)]
    pub long_press_ms: u32,
    #[knuffel(child, unwrap(argument), default = FloatOrInt(0.4))]
    pub significant_move_fraction: FloatOrInt<0, 1>,
    #[knuffel(child, unwrap(argument), default = FloatOrInt(0.33))]
    pub return_to_original_fraction: FloatOrInt<0, 1>,
    #[knuffel(child, unwrap(argument), default = FloatOrInt(0.5))]
    pub dismiss_fraction: FloatOrInt<0, 1>,
}

impl Default for Gestures {
    fn default() -> Self {
        Self {
            touch_slop: FloatOrInt(8.),
            min_fling_velocity: FloatOrInt(1500.),
            fling_threshold_velocity: FloatOrInt(500.),
            long_press_ms: 400,
            significant_move_fraction: FloatOrInt(0.4),
            return_to_original_fraction: FloatOrInt(0.33),
            dismiss_fraction: FloatOrInt(0.5),
        }
    }
}

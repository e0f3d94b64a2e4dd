use crate::FloatOrInt;

/// Geometry of the paged task strip, in density-independent units.
#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    #[knuffel(child, unwrap(argument), default = FloatOrInt(1.))]
    pub density: FloatOrInt<0, 8>,
    #[knuffel(child, unwrap(argument), default = FloatOrInt(0.7))]
    pub task_size_fraction: FloatOrInt<0, 1>,
    #[knuffel(child, unwrap(argument), default = FloatOrInt(24.))]
    pub gap: FloatOrInt<0, 65535>,
    #[knuffel(child)]
    pub right_to_left: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            density: FloatOrInt(1.),
            task_size_fraction: FloatOrInt(0.7),
            gap: FloatOrInt(24.),
            right_to_left: false,
        }
    }
}

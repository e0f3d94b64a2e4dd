use std::str::FromStr;

use knuffel::errors::DecodeError;

use crate::FloatOrInt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animations {
    pub off: bool,
    pub slowdown: f64,
    pub dismiss_fade: Animation,
    pub dismiss_slide: Animation,
    pub dismiss_shift: Animation,
    pub page_snap: Animation,
    pub tile_settle: Animation,
    pub state_transition: Animation,
    pub icon_scale: Animation,
    pub empty_message: Animation,
}

impl Default for Animations {
    fn default() -> Self {
        Self {
            off: false,
            slowdown: 1.,
            dismiss_fade: Animation::easing(300, AnimationCurve::Accel2),
            dismiss_slide: Animation::easing(300, AnimationCurve::Linear),
            dismiss_shift: Animation::easing(300, AnimationCurve::Accel),
            page_snap: Animation::spring(1., 800, 0.0001),
            tile_settle: Animation::spring(0.8, 600, 0.0001),
            state_transition: Animation::easing(250, AnimationCurve::AccelDeaccel),
            icon_scale: Animation::easing(120, AnimationCurve::Linear),
            empty_message: Animation::easing(150, AnimationCurve::Linear),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub off: bool,
    pub kind: AnimationKind,
}

impl Animation {
    pub const fn easing(duration_ms: u32, curve: AnimationCurve) -> Self {
        Self {
            off: false,
            kind: AnimationKind::Easing(EasingParams { duration_ms, curve }),
        }
    }

    pub const fn spring(damping_ratio: f64, stiffness: u32, epsilon: f64) -> Self {
        Self {
            off: false,
            kind: AnimationKind::Spring(SpringParams {
                damping_ratio: FloatOrInt(damping_ratio),
                stiffness,
                epsilon: FloatOrInt(epsilon),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationKind {
    Easing(EasingParams),
    Spring(SpringParams),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EasingParams {
    pub duration_ms: u32,
    pub curve: AnimationCurve,
}

impl Default for EasingParams {
    fn default() -> Self {
        Self {
            duration_ms: 250,
            curve: AnimationCurve::AccelDeaccel,
        }
    }
}

#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    #[knuffel(property, default = FloatOrInt(1.))]
    pub damping_ratio: FloatOrInt<0, 10>,
    #[knuffel(property, default = 800)]
    pub stiffness: u32,
    #[knuffel(property, default = FloatOrInt(0.0001))]
    pub epsilon: FloatOrInt<0, 1>,
}

/// Interpolators used by the task switcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationCurve {
    Linear,
    /// Quadratic ease-in.
    Accel,
    /// Quartic ease-in.
    Accel2,
    /// Quadratic ease-out.
    Deaccel,
    /// Cubic ease-out.
    Deaccel15,
    /// Quartic ease-out.
    Deaccel2,
    AccelDeaccel,
    EaseOutExpo,
}

impl FromStr for AnimationCurve {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "accel" => Ok(Self::Accel),
            "accel-2" => Ok(Self::Accel2),
            "deaccel" => Ok(Self::Deaccel),
            "deaccel-1.5" => Ok(Self::Deaccel15),
            "deaccel-2" => Ok(Self::Deaccel2),
            "accel-deaccel" => Ok(Self::AccelDeaccel),
            "ease-out-expo" => Ok(Self::EaseOutExpo),
            _ => Err(
                "invalid curve, can be linear, accel, accel-2, deaccel, deaccel-1.5, \
                 deaccel-2, accel-deaccel or ease-out-expo",
            ),
        }
    }
}

#[derive(knuffel::Decode, Debug, Default, Clone, Copy, PartialEq)]
struct AnimationPart {
    #[knuffel(child)]
    off: bool,
    #[knuffel(child, unwrap(argument))]
    duration_ms: Option<u32>,
    #[knuffel(child, unwrap(argument, str))]
    curve: Option<AnimationCurve>,
    #[knuffel(child)]
    spring: Option<SpringParams>,
}

impl AnimationPart {
    fn resolve(self, default: Animation) -> Animation {
        let kind = if let Some(spring) = self.spring {
            AnimationKind::Spring(spring)
        } else if self.duration_ms.is_some() || self.curve.is_some() {
            let base = match default.kind {
                AnimationKind::Easing(params) => params,
                AnimationKind::Spring(_) => EasingParams::default(),
            };
            AnimationKind::Easing(EasingParams {
                duration_ms: self.duration_ms.unwrap_or(base.duration_ms),
                curve: self.curve.unwrap_or(base.curve),
            })
        } else {
            default.kind
        };

        Animation {
            off: self.off,
            kind,
        }
    }
}

#[derive(knuffel::Decode, Debug, Default, Clone, Copy, PartialEq)]
struct AnimationsPart {
    #[knuffel(child)]
    off: bool,
    #[knuffel(child, unwrap(argument))]
    slowdown: Option<FloatOrInt<0, 100>>,
    #[knuffel(child)]
    dismiss_fade: Option<AnimationPart>,
    #[knuffel(child)]
    dismiss_slide: Option<AnimationPart>,
    #[knuffel(child)]
    dismiss_shift: Option<AnimationPart>,
    #[knuffel(child)]
    page_snap: Option<AnimationPart>,
    #[knuffel(child)]
    tile_settle: Option<AnimationPart>,
    #[knuffel(child)]
    state_transition: Option<AnimationPart>,
    #[knuffel(child)]
    icon_scale: Option<AnimationPart>,
    #[knuffel(child)]
    empty_message: Option<AnimationPart>,
}

impl<S> knuffel::Decode<S> for Animations
where
    S: knuffel::traits::ErrorSpan,
{
    fn decode_node(
        node: &knuffel::ast::SpannedNode<S>,
        ctx: &mut knuffel::decode::Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        // An animation is either a spring or an easing, never both.
        for child in node.children() {
            let mut has_spring = false;
            let mut has_easing = false;
            for grandchild in child.children() {
                match &**grandchild.node_name {
                    "spring" => has_spring = true,
                    "duration-ms" | "curve" => has_easing = true,
                    _ => (),
                }
            }

            if has_spring && has_easing {
                ctx.emit_error(DecodeError::unexpected(
                    child,
                    "node",
                    format!(
                        "animation `{}` cannot have both a spring and an easing curve",
                        &**child.node_name
                    ),
                ));
            }
        }

        let part = AnimationsPart::decode_node(node, ctx)?;
        let default = Animations::default();
        let resolve = |part: Option<AnimationPart>, default: Animation| {
            part.map_or(default, |part| part.resolve(default))
        };

        Ok(Self {
            off: part.off,
            slowdown: part.slowdown.map_or(default.slowdown, |x| x.0),
            dismiss_fade: resolve(part.dismiss_fade, default.dismiss_fade),
            dismiss_slide: resolve(part.dismiss_slide, default.dismiss_slide),
            dismiss_shift: resolve(part.dismiss_shift, default.dismiss_shift),
            page_snap: resolve(part.page_snap, default.page_snap),
            tile_settle: resolve(part.tile_settle, default.tile_settle),
            state_transition: resolve(part.state_transition, default.state_transition),
            icon_scale: resolve(part.icon_scale, default.icon_scale),
            empty_message: resolve(part.empty_message, default.empty_message),
        })
    }
}

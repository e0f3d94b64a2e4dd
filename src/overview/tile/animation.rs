use super::TaskTile;
use crate::animation::Animation;
use crate::overview::animated_value::AnimatedValue;

impl TaskTile {
    pub fn advance_animations(&mut self) {
        self.alpha.advance();
        self.translation_x.advance();
        self.translation_y.advance();
        self.icon_scale.advance();
    }

    pub fn are_animations_ongoing(&self) -> bool {
        self.alpha.is_animation_ongoing()
            || self.translation_x.is_animation_ongoing()
            || self.translation_y.is_animation_ongoing()
            || self.icon_scale.is_animation_ongoing()
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = AnimatedValue::new(alpha.clamp(0., 1.));
    }

    pub fn set_translation_x(&mut self, value: f64) {
        self.translation_x = AnimatedValue::new(value);
    }

    pub fn set_translation_y(&mut self, value: f64) {
        self.translation_y = AnimatedValue::new(value);
    }

    pub fn animate_alpha(&mut self, to: f64, config: recents_config::Animation) {
        let from = self.alpha();
        let to = to.clamp(0., 1.);
        self.alpha =
            AnimatedValue::Animation(Animation::new(self.clock.clone(), from, to, 0., config));
    }

    pub fn animate_translation_x(&mut self, to: f64, config: recents_config::Animation) {
        let from = self.translation_x();
        self.translation_x =
            AnimatedValue::Animation(Animation::new(self.clock.clone(), from, to, 0., config));
    }

    /// Animates the vertical offset, continuing with the finger's velocity in px/s.
    pub fn animate_translation_y(
        &mut self,
        to: f64,
        velocity: f64,
        config: recents_config::Animation,
    ) {
        let from = self.translation_y();
        self.translation_y = AnimatedValue::Animation(Animation::new(
            self.clock.clone(),
            from,
            to,
            velocity,
            config,
        ));
    }

    pub fn animate_icon_scale(&mut self, to: f64, config: recents_config::Animation) {
        let from = self.icon_scale();
        if from == to && self.icon_scale.is_static() {
            return;
        }

        self.icon_scale =
            AnimatedValue::Animation(Animation::new(self.clock.clone(), from, to, 0., config));
    }

    pub fn stop_animations(&mut self) {
        self.alpha.stop_anim_and_gesture();
        self.translation_x.stop_anim_and_gesture();
        self.translation_y.stop_anim_and_gesture();
        self.icon_scale.stop_anim_and_gesture();
    }
}

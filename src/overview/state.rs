//! Launcher states and the transitions between them.
//!
//! Only one transition runs at a time. A transition is a shared record that both the
//! coordinator and any [`StateAnimationController`] handed out for it point to; superseding the
//! transition detaches the old controllers, which then become inert.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::animation::{Animation, Clock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LauncherState {
    Normal,
    SpringLoaded,
    Overview,
    OverviewPeek,
    QuickSwitch,
    BackgroundApp,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StateFlags: u8 {
        const CAN_DRAG_ICONS = 1;
        const HIDE_BACK_BUTTON = 1 << 1;
        const HAS_SCRIM = 1 << 2;
        const OVERVIEW_UI = 1 << 3;
        const DISABLE_INTERACTION = 1 << 4;
        const DISABLE_RESTORE = 1 << 5;
    }
}

const SCRIM_ALPHA: f64 = 0.6;

/// Values the state transition animates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVisuals {
    pub content_alpha: f64,
    pub scrim_alpha: f64,
    pub overview_scale: f64,
}

impl LauncherState {
    pub fn flags(self) -> StateFlags {
        match self {
            LauncherState::Normal => StateFlags::CAN_DRAG_ICONS,
            LauncherState::SpringLoaded => {
                StateFlags::CAN_DRAG_ICONS
                    | StateFlags::HIDE_BACK_BUTTON
                    | StateFlags::DISABLE_RESTORE
            }
            LauncherState::Overview | LauncherState::OverviewPeek => {
                StateFlags::OVERVIEW_UI | StateFlags::HAS_SCRIM | StateFlags::DISABLE_RESTORE
            }
            LauncherState::QuickSwitch => {
                StateFlags::OVERVIEW_UI
                    | StateFlags::DISABLE_RESTORE
                    | StateFlags::DISABLE_INTERACTION
            }
            LauncherState::BackgroundApp => {
                StateFlags::OVERVIEW_UI
                    | StateFlags::HIDE_BACK_BUTTON
                    | StateFlags::DISABLE_RESTORE
                    | StateFlags::DISABLE_INTERACTION
            }
        }
    }

    pub fn is_overview_ui(self) -> bool {
        self.flags().contains(StateFlags::OVERVIEW_UI)
    }

    pub fn disables_interaction(self) -> bool {
        self.flags().contains(StateFlags::DISABLE_INTERACTION)
    }

    /// Leaving the overview for one of these tears it down.
    pub fn resets_overview(self) -> bool {
        matches!(self, LauncherState::Normal | LauncherState::SpringLoaded)
    }

    pub fn visuals(self) -> StateVisuals {
        let content_alpha = match self {
            LauncherState::Overview | LauncherState::OverviewPeek | LauncherState::QuickSwitch => 1.,
            _ => 0.,
        };

        let flags = self.flags();
        let scrim_alpha = if flags.contains(StateFlags::OVERVIEW_UI | StateFlags::HAS_SCRIM) {
            SCRIM_ALPHA
        } else {
            0.
        };

        let overview_scale = match self {
            LauncherState::OverviewPeek => 0.9,
            LauncherState::Normal | LauncherState::SpringLoaded => 1.1,
            _ => 1.,
        };

        StateVisuals {
            content_alpha,
            scrim_alpha,
            overview_scale,
        }
    }
}

impl fmt::Display for LauncherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LauncherState::Normal => "normal",
            LauncherState::SpringLoaded => "spring-loaded",
            LauncherState::Overview => "overview",
            LauncherState::OverviewPeek => "overview-peek",
            LauncherState::QuickSwitch => "quick-switch",
            LauncherState::BackgroundApp => "background-app",
        };
        f.write_str(name)
    }
}

impl StateVisuals {
    pub fn lerp(self, to: StateVisuals, t: f64) -> StateVisuals {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        StateVisuals {
            content_alpha: mix(self.content_alpha, to.content_alpha),
            scrim_alpha: mix(self.scrim_alpha, to.scrim_alpha),
            overview_scale: mix(self.overview_scale, to.overview_scale),
        }
    }
}

pub type EndAction = Box<dyn FnOnce(LauncherState)>;

/// What a transition ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The target state was reached.
    Completed {
        from: LauncherState,
        to: LauncherState,
    },
    /// Played back to its start; the state didn't change.
    Reverted(LauncherState),
}

struct Transition {
    from_state: LauncherState,
    to_state: LauncherState,
    from: StateVisuals,
    to: StateVisuals,
    fraction: f64,
    playback: Option<Animation>,
    end_action: Option<EndAction>,
    detached: bool,
    clock: Clock,
    config: recents_config::Animation,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from_state", &self.from_state)
            .field("to_state", &self.to_state)
            .field("fraction", &self.fraction())
            .field("playing", &self.playback.is_some())
            .field("detached", &self.detached)
            .finish()
    }
}

impl Transition {
    fn fraction(&self) -> f64 {
        match &self.playback {
            Some(anim) => anim.clamped_value().clamp(0., 1.),
            None => self.fraction,
        }
    }

    fn visuals(&self) -> StateVisuals {
        self.from.lerp(self.to, self.fraction())
    }

    fn play_to(&mut self, target: f64) {
        let from = self.fraction();
        self.fraction = from;
        self.playback = Some(Animation::new(
            self.clock.clone(),
            from,
            target,
            0.,
            self.config,
        ));
    }

    fn finished_at(&self) -> Option<f64> {
        let anim = self.playback.as_ref()?;
        anim.is_done().then_some(anim.to())
    }
}

/// Scrubbable handle on one state transition.
#[derive(Debug, Clone)]
pub struct StateAnimationController {
    inner: Rc<RefCell<Transition>>,
}

impl StateAnimationController {
    pub fn target(&self) -> LauncherState {
        self.inner.borrow().to_state
    }

    /// Whether a newer transition took over from this one.
    pub fn is_detached(&self) -> bool {
        self.inner.borrow().detached
    }

    pub fn play_fraction(&self) -> f64 {
        self.inner.borrow().fraction()
    }

    /// Moves the transition to `fraction`, stopping any playback.
    pub fn set_play_fraction(&self, fraction: f64) {
        let mut inner = self.inner.borrow_mut();
        if inner.detached {
            return;
        }
        inner.playback = None;
        inner.fraction = fraction.clamp(0., 1.);
    }

    pub fn set_end_action(&self, action: EndAction) {
        let mut inner = self.inner.borrow_mut();
        if inner.detached {
            debug!("ignoring end action for a superseded transition");
            return;
        }
        inner.end_action = Some(action);
    }

    pub fn animate_to_end(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.detached {
            inner.play_to(1.);
        }
    }

    pub fn animate_to_start(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.detached {
            inner.play_to(0.);
        }
    }
}

#[derive(Debug)]
pub struct StateTransitionCoordinator {
    state: LauncherState,
    visuals: StateVisuals,
    transition: Option<Rc<RefCell<Transition>>>,
    clock: Clock,
    config: recents_config::Animation,
}

impl StateTransitionCoordinator {
    pub fn new(state: LauncherState, clock: Clock, config: recents_config::Animation) -> Self {
        Self {
            state,
            visuals: state.visuals(),
            transition: None,
            clock,
            config,
        }
    }

    pub fn set_config(&mut self, config: recents_config::Animation) {
        self.config = config;
    }

    /// Last state that was fully reached.
    pub fn state(&self) -> LauncherState {
        self.state
    }

    /// State the running transition heads to.
    pub fn target_state(&self) -> Option<LauncherState> {
        self.transition.as_ref().map(|t| t.borrow().to_state)
    }

    pub fn is_in_transition(&self) -> bool {
        self.transition.is_some()
    }

    pub fn visuals(&self) -> StateVisuals {
        match &self.transition {
            Some(transition) => transition.borrow().visuals(),
            None => self.visuals,
        }
    }

    pub fn transition_fraction(&self) -> Option<f64> {
        self.transition.as_ref().map(|t| t.borrow().fraction())
    }

    /// Starts a transition to `target`. An animated transition is driven by
    /// [`advance_animations`](Self::advance_animations); otherwise it completes right away.
    pub fn go_to_state(
        &mut self,
        target: LauncherState,
        animate: bool,
        on_complete: Option<EndAction>,
    ) -> Option<TransitionOutcome> {
        if target == self.state && self.transition.is_none() {
            trace!("already in {target}");
            if let Some(action) = on_complete {
                action(target);
            }
            return None;
        }

        if !animate {
            self.supersede();
            let from = self.state;
            self.state = target;
            self.visuals = target.visuals();
            if let Some(action) = on_complete {
                action(target);
            }
            return Some(TransitionOutcome::Completed { from, to: target });
        }

        let controller = self.create_controller(target);
        if let Some(action) = on_complete {
            controller.set_end_action(action);
        }
        controller.animate_to_end();
        None
    }

    /// Creates a scrubbable transition to `target`, superseding any running one.
    pub fn create_controller(&mut self, target: LauncherState) -> StateAnimationController {
        let from = self.visuals();
        self.supersede();

        debug!("state transition {} -> {target}", self.state);
        let transition = Transition {
            from_state: self.state,
            to_state: target,
            from,
            to: target.visuals(),
            fraction: 0.,
            playback: None,
            end_action: None,
            detached: false,
            clock: self.clock.clone(),
            config: self.config,
        };
        let inner = Rc::new(RefCell::new(transition));
        self.transition = Some(inner.clone());
        StateAnimationController { inner }
    }

    /// Finishes the running transition once its playback is done.
    pub fn advance_animations(&mut self) -> Option<TransitionOutcome> {
        let transition = self.transition.as_ref()?;
        let end = transition.borrow().finished_at()?;
        let transition = self.transition.take()?;

        let mut transition = transition.borrow_mut();
        transition.detached = true;
        let action = transition.end_action.take();

        if end >= 1. {
            let from = self.state;
            self.state = transition.to_state;
            self.visuals = transition.to;
            drop(transition);

            if let Some(action) = action {
                action(self.state);
            }
            Some(TransitionOutcome::Completed {
                from,
                to: self.state,
            })
        } else {
            self.visuals = transition.from;
            debug!("transition to {} reverted", transition.to_state);
            Some(TransitionOutcome::Reverted(self.state))
        }
    }

    /// Detaches the running transition where it is, dropping its end action.
    fn supersede(&mut self) {
        if let Some(transition) = self.transition.take() {
            let mut transition = transition.borrow_mut();
            debug!("superseding transition to {}", transition.to_state);
            self.visuals = transition.visuals();
            transition.detached = true;
            transition.end_action = None;
            transition.playback = None;
        }
    }
}

//! Replays a recorded input trace against a headless recents strip.

#[macro_use]
extern crate tracing;

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead as _, BufReader};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use std::{env, process};

use anyhow::{anyhow, Context as _};
use clap::Parser;
use glam::DVec2;
use recents::animation::Clock;
use recents::geometry::Rect;
use recents::host::{
    Collaborators, IconProvider, SurfaceTransformApplier, TaskEvent, TaskRemovalSink, TaskSource,
};
use recents::input::{Key, KeyEvent, Modifiers, Pointer, TouchAction, TouchEvent};
use recents::overview::state::LauncherState;
use recents::overview::RecentsView;
use recents::task::{ComponentName, IconHandle, RawTaskDescriptor, TaskId, TaskRecord, UserId};
use recents_config::Config;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recents")]
#[command(about = "Replay an input trace against the recents strip")]
struct Cli {
    /// Path to a KDL config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Viewport width in pixels.
    #[arg(long, default_value_t = 1080.)]
    width: f64,
    /// Viewport height in pixels.
    #[arg(long, default_value_t = 2340.)]
    height: f64,
    /// Newline-delimited JSON trace.
    trace: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TraceEvent {
    SetDataset(Vec<i32>),
    Touch(TraceTouch),
    Key(TraceKey),
    AdvanceMs(u64),
    GoToState {
        state: LauncherState,
        #[serde(default)]
        animate: bool,
    },
    Dismiss {
        index: usize,
        #[serde(default)]
        animate: bool,
        #[serde(default)]
        remove: bool,
    },
    GestureStart(i32),
    GestureProgress(f64),
    GestureEnd,
    GestureCancelled,
    StackChanged,
}

#[derive(Debug, Deserialize)]
struct TraceTouch {
    action: TraceTouchAction,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TraceTouchAction {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Deserialize)]
struct TraceKey {
    key: TraceKeyName,
    #[serde(default)]
    shift: bool,
    #[serde(default)]
    alt: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TraceKeyName {
    Tab,
    Left,
    Right,
    Up,
    Down,
    Delete,
    Enter,
    Escape,
}

impl From<TraceKeyName> for Key {
    fn from(value: TraceKeyName) -> Self {
        match value {
            TraceKeyName::Tab => Key::Tab,
            TraceKeyName::Left => Key::Left,
            TraceKeyName::Right => Key::Right,
            TraceKeyName::Up => Key::Up,
            TraceKeyName::Down => Key::Down,
            TraceKeyName::Delete => Key::Delete,
            TraceKeyName::Enter => Key::Enter,
            TraceKeyName::Escape => Key::Escape,
        }
    }
}

/// Task stack as the replayed system sees it.
type Stack = Rc<RefCell<Vec<RawTaskDescriptor>>>;

fn descriptor(id: i32) -> RawTaskDescriptor {
    RawTaskDescriptor {
        id: TaskId(id),
        base_component: ComponentName::new(format!("org.example.app{id}"), "Main"),
        top_component: None,
        user: UserId::default(),
        dockable: true,
    }
}

struct ReplaySource {
    stack: Stack,
    subscriber: Rc<RefCell<Option<async_channel::Sender<TaskEvent>>>>,
}

impl TaskSource for ReplaySource {
    fn list_running_tasks(&mut self, limit: usize) -> Vec<RawTaskDescriptor> {
        let stack = self.stack.borrow();
        let skip = stack.len().saturating_sub(limit);
        stack[skip..].to_vec()
    }

    fn subscribe(&mut self, sender: async_channel::Sender<TaskEvent>) {
        debug!("task source subscribed");
        *self.subscriber.borrow_mut() = Some(sender);
    }

    fn unsubscribe(&mut self) {
        debug!("task source unsubscribed");
        *self.subscriber.borrow_mut() = None;
    }
}

struct ReplayIcons;

impl IconProvider for ReplayIcons {
    fn icon_for(&mut self, component: &ComponentName, _user: UserId) -> anyhow::Result<IconHandle> {
        Ok(IconHandle::Loaded(component.package.as_str().into()))
    }
}

struct ReplaySurfaces;

impl SurfaceTransformApplier for ReplaySurfaces {
    fn apply_transform(&mut self, targets: &[TaskId], progress: f64, rect: Rect, alpha: f64) {
        trace!(
            "surfaces {targets:?}: progress={progress:.2} rect=({:.0}, {:.0}) {:.0}x{:.0} alpha={alpha:.2}",
            rect.loc.x,
            rect.loc.y,
            rect.size.x,
            rect.size.y,
        );
    }

    fn on_overview_reset(&mut self) {
        debug!("surfaces reset");
    }
}

struct ReplayRemoval {
    stack: Stack,
}

impl TaskRemovalSink for ReplayRemoval {
    fn remove_task(&mut self, task: TaskId) {
        info!("removing task {task}");
        self.stack.borrow_mut().retain(|raw| raw.id != task);
    }
}

fn main() {
    let directives = env::var("RUST_LOG").unwrap_or_else(|_| "recents=debug".to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err:?}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path).map_err(|err| anyhow!("{err:?}"))?,
        None => Config::default(),
    };

    let file = File::open(&cli.trace).with_context(|| format!("error opening {:?}", cli.trace))?;

    let stack = Stack::default();
    let subscriber = Rc::new(RefCell::new(None));
    let collaborators = Collaborators {
        task_source: Box::new(ReplaySource {
            stack: stack.clone(),
            subscriber: subscriber.clone(),
        }),
        icons: Box::new(ReplayIcons),
        surfaces: Box::new(ReplaySurfaces),
        removal: Box::new(ReplayRemoval {
            stack: stack.clone(),
        }),
    };

    let mut clock = Clock::with_time(Duration::ZERO);
    let viewport = DVec2::new(cli.width, cli.height);
    let mut view = RecentsView::new(clock.clone(), &config, viewport, collaborators);
    let mut now = Duration::ZERO;

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("error reading trace")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let event: TraceEvent = serde_json::from_str(line)
            .with_context(|| format!("error parsing trace line {}", idx + 1))?;
        trace!("{event:?}");

        match event {
            TraceEvent::SetDataset(ids) => {
                *stack.borrow_mut() = ids.iter().copied().map(descriptor).collect();
                let tasks = ids
                    .into_iter()
                    .map(|id| TaskRecord::from(descriptor(id)))
                    .collect();
                view.set_dataset(tasks);
            }
            TraceEvent::Touch(touch) => {
                let action = match touch.action {
                    TraceTouchAction::Down => TouchAction::Down,
                    TraceTouchAction::Move => TouchAction::Move,
                    TraceTouchAction::Up => TouchAction::Up,
                    TraceTouchAction::Cancel => TouchAction::Cancel,
                };
                let pointer = Pointer {
                    id: 0,
                    pos: DVec2::new(touch.x, touch.y),
                };
                let event = TouchEvent::new(action, now, &[pointer]);
                if !view.handle_touch(&event) {
                    debug!("touch not handled");
                }
            }
            TraceEvent::Key(key) => {
                let mut modifiers = Modifiers::empty();
                modifiers.set(Modifiers::SHIFT, key.shift);
                modifiers.set(Modifiers::ALT, key.alt);
                let handled =
                    view.dispatch_key_event(KeyEvent::with_modifiers(key.key.into(), modifiers));
                println!("{:>7} key {:?} handled={handled}", now.as_millis(), key.key);
            }
            TraceEvent::AdvanceMs(ms) => {
                // Tick like a 60 Hz display would.
                let end = now + Duration::from_millis(ms);
                while now < end {
                    now = (now + Duration::from_millis(16)).min(end);
                    clock.set_unadjusted(now);
                    view.dispatch_task_events();
                    view.advance_animations();
                }
            }
            TraceEvent::GoToState { state, animate } => view.go_to_state(state, animate, None),
            TraceEvent::Dismiss {
                index,
                animate,
                remove,
            } => match view.tile_id_at(index) {
                Some(tile) => {
                    view.dismiss_task(tile, animate, remove);
                }
                None => warn!("no tile at page {index}"),
            },
            TraceEvent::GestureStart(id) => view.on_gesture_animation_start(TaskId(id)),
            TraceEvent::GestureProgress(progress) => view.update_gesture_progress(progress),
            TraceEvent::GestureEnd => view.on_gesture_animation_end(),
            TraceEvent::GestureCancelled => view.on_gesture_animation_cancelled(),
            TraceEvent::StackChanged => match &*subscriber.borrow() {
                Some(sender) => {
                    let _ = sender.try_send(TaskEvent::TaskStackChanged);
                }
                None => debug!("stack changed with nobody listening"),
            },
        }

        for event in view.take_events() {
            println!("{:>7} {event:?}", now.as_millis());
        }
    }

    println!();
    print!("{}", view.describe());
    Ok(())
}

//! Top-level application state and the fixed-step run loop.
//!
//! `AppState` owns the [`GestureDetector`], its listeners, the latest
//! tracking frame and the template library. The run loop feeds it frames,
//! ticks recognition at `tick_hz` and hands the result to the visualizer.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use hand_pose::{
    describe_pose, GestureDetector, GestureError, HandSnapshot, Handedness, ListenerRegistry,
    TemplateId, TrackerState, Transition,
};

use crate::library::{Library, LibraryError};
use crate::settings::{period_for, AppSettings, SettingsError};
use crate::source::spawn_frame_source;
use crate::visualizer::Visualizer;

/// Most recent recognition events kept for display.
const RECENT_EVENTS: usize = 8;
/// Catch-up limit per rendered frame; older backlog is dropped.
const MAX_STEPS_PER_FRAME: u32 = 5;

// ════════════════════════════════════════════════════════════════════════════
// AppCommand / AppError
// ════════════════════════════════════════════════════════════════════════════

/// User action, decoded from the window's keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppCommand {
    /// Record the configured default hand.
    CaptureDefault,
    CaptureLeft,
    CaptureRight,
    /// Log every tracked joint.
    DumpPose,
    ClearTemplates,
    Quit,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error("detector: {0}")]
    Detector(#[from] GestureError),
    #[error("window: {0}")]
    Window(#[from] minifb::Error),
    #[error("tracking source stopped")]
    SourceStopped,
}

// ════════════════════════════════════════════════════════════════════════════
// TemplateRow
// ════════════════════════════════════════════════════════════════════════════

/// One line of the template panel.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateRow {
    pub id:        TemplateId,
    pub name:      String,
    pub hand:      Handedness,
    pub joints:    usize,
    /// Summed joint distance to the live pose; `None` without a palm.
    pub distance:  Option<f32>,
    pub threshold: f32,
    pub held:      bool,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    detector:    GestureDetector,
    listeners:   ListenerRegistry,
    events_rx:   Receiver<String>,
    recent:      VecDeque<String>,
    frame:       HandSnapshot,
    library:     Library,
    name_prompt: bool,
    pub status:  String,
}

impl AppState {
    /// Build the detector and load the template library.
    ///
    /// Bad library entries are skipped with a warning; an unreadable library
    /// file is an error so it is never overwritten.
    pub fn new(settings: &AppSettings) -> Result<Self, AppError> {
        settings.validate()?;
        let mut detector = GestureDetector::new(settings.detector.clone())?;
        let library = Library::new(&settings.library_path);

        for template in library.load()? {
            let name = template.name.clone();
            if let Err(e) = detector.add_template(template) {
                warn!(gesture = %name, error = %e, "skipping library entry");
            }
        }

        let (events_tx, events_rx) = mpsc::channel();
        let mut listeners = ListenerRegistry::new();
        register_logging(&mut listeners, events_tx);

        let status = format!(
            "Ready: {} template(s), threshold {:.3} m",
            detector.store().len(),
            detector.matcher().threshold(),
        );
        Ok(AppState {
            detector,
            listeners,
            events_rx,
            recent: VecDeque::with_capacity(RECENT_EVENTS),
            frame: HandSnapshot::new(),
            library,
            name_prompt: settings.name_prompt,
            status,
        })
    }

    /// Replace the live frame that the next tick will read.
    pub fn set_frame(&mut self, frame: HandSnapshot) {
        self.frame = frame;
    }

    // ── process one AppCommand ───────────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::CaptureDefault => self.capture(self.detector.config().default_handedness),
            AppCommand::CaptureLeft    => self.capture(Handedness::Left),
            AppCommand::CaptureRight   => self.capture(Handedness::Right),
            AppCommand::DumpPose       => self.dump_pose(),
            AppCommand::ClearTemplates => self.clear(),
            AppCommand::Quit           => { /* handled in run loop */ }
        }
    }

    fn capture(&mut self, hand: Handedness) {
        // Freeze the pose before any prompt so typing a name can't move it.
        let frame = self.frame.clone();
        let result = match self.name_prompt.then(prompt_gesture_name).flatten() {
            Some(name) => self.detector.capture_named(&frame, hand, &name),
            None       => self.detector.capture_gesture(&frame, hand),
        };
        let id = match result {
            Ok(id) => id,
            Err(e) => {
                warn!(%hand, error = %e, "capture failed");
                self.status = format!("Capture failed: {}", e);
                return;
            }
        };
        let Ok(template) = self.detector.template(id) else { return };
        if template.is_empty() {
            self.status = format!("Captured {} {} with NO joints (palm not tracked)", id, template.handedness);
        } else {
            info!(%id, name = %template.name, hand = %template.handedness, joints = template.joint_count(), "gesture captured");
            self.status = format!(
                "Captured {} \"{}\" ({} hand, {} joints)",
                id, template.name, template.handedness, template.joint_count()
            );
        }
        self.save_library();
    }

    fn dump_pose(&mut self) {
        let text = describe_pose(&self.frame);
        if text.is_empty() {
            info!("pose dump: no joints tracked");
        } else {
            info!("pose dump:\n{}", text.trim_end());
        }
        self.status = format!(
            "Pose: right {} joints, left {} joints",
            self.frame.tracked_count(Handedness::Right),
            self.frame.tracked_count(Handedness::Left),
        );
    }

    fn clear(&mut self) {
        let before = self.detector.store().clone();
        let released = self.detector.clear_templates();
        self.listeners.dispatch(&released, &before);
        for (id, _) in before.iter() {
            self.listeners.remove(id);
        }
        self.drain_events();
        info!(removed = before.len(), "templates cleared");
        self.status = format!("Cleared {} template(s)", before.len());
        self.save_library();
    }

    /// Write the current templates to the library file.
    pub fn save_library(&mut self) {
        let store = self.detector.store();
        if let Err(e) = self.library.save(store.iter().map(|(_, t)| t)) {
            warn!(error = %e, "could not save template library");
            self.status = format!("Save failed: {}", e);
        }
    }

    // ── Per-step tick ─────────────────────────────────────────────────────

    /// One recognition step on the latest frame.
    pub fn tick(&mut self) -> Transition {
        let transition = self.detector.tick(&self.frame);
        self.listeners.dispatch(&transition, self.detector.store());
        self.drain_events();
        transition
    }

    fn drain_events(&mut self) {
        while let Ok(line) = self.events_rx.try_recv() {
            if self.recent.len() == RECENT_EVENTS {
                self.recent.pop_front();
            }
            self.status = line.clone();
            self.recent.push_back(line);
        }
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn detector(&self) -> &GestureDetector     { &self.detector }
    pub fn frame(&self)    -> &HandSnapshot        { &self.frame }
    pub fn recent(&self)   -> &VecDeque<String>    { &self.recent }

    pub fn held(&self) -> Option<TemplateId> {
        match self.detector.state() {
            TrackerState::Holding(id) => Some(id),
            TrackerState::Idle        => None,
        }
    }

    pub fn template_rows(&self) -> Vec<TemplateRow> {
        let held = self.held();
        let store = self.detector.store();
        let matcher = self.detector.matcher();
        self.detector
            .distances(&self.frame)
            .into_iter()
            .filter_map(|(id, distance)| {
                let t = store.get(id)?;
                Some(TemplateRow {
                    id,
                    name:      t.name.clone(),
                    hand:      t.handedness,
                    joints:    t.joint_count(),
                    distance,
                    threshold: matcher.threshold_for(t),
                    held:      held == Some(id),
                })
            })
            .collect()
    }
}

/// Log every transition and forward a one-line summary to the status bar.
fn register_logging(listeners: &mut ListenerRegistry, events: Sender<String>) {
    let tx = events.clone();
    listeners.on_any_recognise(move |id, t| {
        info!(%id, name = %t.name, hand = %t.handedness, "gesture recognised");
        let _ = tx.send(format!("Recognised {} \"{}\"", id, t.name));
    });
    listeners.on_any_derecognise(move |id, t| {
        info!(%id, name = %t.name, hand = %t.handedness, "gesture derecognised");
        let _ = events.send(format!("Released {} \"{}\"", id, t.name));
    });
}

/// Ask on stdin for a gesture name. Empty input keeps the default name.
pub fn prompt_gesture_name() -> Option<String> {
    print!("\n  Gesture name (Enter for default): ");
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok()?;
    let name = buf.trim();
    (!name.is_empty()).then(|| name.to_string())
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the visualizer and the frame source (simulation by default,
/// hardware with `--features leap`), then loops: input, frames, fixed-step
/// recognition, render. The library is saved on the way out.
pub fn run(settings: AppSettings) -> Result<(), AppError> {
    let mut app = AppState::new(&settings)?;

    #[cfg(not(feature = "leap"))]
    let (sim_tx, frames) = {
        let (tx, rx) = mpsc::channel();
        let source = crate::source::SimFrameSource::new(rx, &settings.sim);
        (Some(tx), spawn_frame_source(source))
    };
    #[cfg(feature = "leap")]
    let (sim_tx, frames) = (None, spawn_frame_source(crate::source::LeapFrameSource));

    let mut vis = Visualizer::new(&settings.view, &settings.sim, sim_tx)?;

    let step = period_for(settings.tick_hz);
    let mut last = Instant::now();
    let mut backlog = Duration::ZERO;
    info!(tick_hz = settings.tick_hz, "recognition loop running");

    let outcome = 'main: loop {
        if !vis.is_open() {
            break Ok(());
        }

        // 1. Window input
        for cmd in vis.poll_input() {
            if cmd == AppCommand::Quit {
                break 'main Ok(());
            }
            app.handle_command(cmd);
        }

        // 2. Keep only the newest frame
        loop {
            match frames.try_recv() {
                Ok(frame)                       => app.set_frame(frame),
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => break 'main Err(AppError::SourceStopped),
            }
        }

        // 3. Fixed-step recognition
        let now = Instant::now();
        backlog += now - last;
        last = now;
        let mut steps = 0;
        while backlog >= step && steps < MAX_STEPS_PER_FRAME {
            app.tick();
            backlog -= step;
            steps += 1;
        }
        if steps == MAX_STEPS_PER_FRAME {
            backlog = Duration::ZERO;
        }

        // 4. Render
        vis.render(app.frame(), &app.template_rows(), app.recent(), &app.status);
    };

    app.save_library();
    outcome
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

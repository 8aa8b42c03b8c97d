//! Hand-tracking frames — from LeapMotion hardware or the keyboard simulator.
//!
//! Either way the app receives whole [`HandSnapshot`]s over an `mpsc`
//! channel and never learns which kind of source produced them.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use hand_pose::{HandSnapshot, Handedness};

use crate::settings::{period_for, SimSettings};
use crate::sim_hand::{PosePreset, SimHand};

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`HandSnapshot`]s over a channel.
///
/// `run` returns once the receiving end hangs up.
pub trait FrameSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandSnapshot>);
}

/// Spawn a frame source on its own thread and return the receiving end.
pub fn spawn_frame_source<S: FrameSource>(source: S) -> Receiver<HandSnapshot> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimFrameSource — keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Edit to the simulated hands, sent by the visualizer window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Make the other hand the one that the remaining inputs act on.
    SwitchHand,
    SelectPose(PosePreset),
    /// Translate the active hand, metres.
    Move(Vector3<f32>),
    /// Rotate the active hand about the view axis, radians.
    Twist(f32),
    /// Show or hide the active hand entirely.
    ToggleHand,
    /// Drop or restore the active hand's palm joint.
    TogglePalm,
}

/// Two [`SimHand`]s driven by [`SimInput`]s, sampled at a fixed rate.
pub struct SimFrameSource {
    rx:     Receiver<SimInput>,
    right:  SimHand,
    left:   SimHand,
    active: Handedness,
    period: Duration,
    rng:    StdRng,
}

impl SimFrameSource {
    pub fn new(rx: Receiver<SimInput>, settings: &SimSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        SimFrameSource {
            rx,
            right:  SimHand::new(Handedness::Right, Point3::new( 0.15, 1.2, 0.4), settings.tremor_m),
            left:   SimHand::new(Handedness::Left,  Point3::new(-0.15, 1.2, 0.4), settings.tremor_m),
            active: Handedness::Right,
            period: period_for(settings.frame_hz),
            rng,
        }
    }

    pub fn active(&self) -> Handedness {
        self.active
    }

    pub fn hand(&self, side: Handedness) -> &SimHand {
        match side {
            Handedness::Left => &self.left,
            _                => &self.right,
        }
    }

    fn active_mut(&mut self) -> &mut SimHand {
        match self.active {
            Handedness::Left => &mut self.left,
            _                => &mut self.right,
        }
    }

    pub fn apply(&mut self, input: SimInput) {
        debug!(?input, hand = %self.active, "sim input");
        match input {
            SimInput::SwitchHand => {
                self.active = match self.active {
                    Handedness::Right => Handedness::Left,
                    _                 => Handedness::Right,
                };
            }
            SimInput::SelectPose(p) => self.active_mut().preset = p,
            SimInput::Move(d)       => self.active_mut().position += d,
            SimInput::Twist(a)      => self.active_mut().angles[2] += a,
            SimInput::ToggleHand    => {
                let h = self.active_mut();
                h.visible = !h.visible;
            }
            SimInput::TogglePalm    => {
                let h = self.active_mut();
                h.palm_visible = !h.palm_visible;
            }
        }
    }

    /// Sample both hands once.
    pub fn frame(&mut self) -> HandSnapshot {
        let mut snap = HandSnapshot::new();
        self.right.write_into(&mut snap, &mut self.rng);
        self.left.write_into(&mut snap, &mut self.rng);
        snap
    }
}

impl FrameSource for SimFrameSource {
    fn run(mut self: Box<Self>, tx: Sender<HandSnapshot>) {
        info!(period_ms = self.period.as_millis() as u64, "simulated hands running");
        loop {
            match self.rx.recv_timeout(self.period) {
                Ok(input) => {
                    self.apply(input);
                    while let Ok(more) = self.rx.try_recv() {
                        self.apply(more);
                    }
                }
                Err(RecvTimeoutError::Timeout)      => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
            if tx.send(self.frame()).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapFrameSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Frame source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// LeapC reports millimetres; joints are converted to metres so the same
/// recognition threshold applies in both modes. Every joint of a hand
/// carries the palm orientation.
#[cfg(feature = "leap")]
pub struct LeapFrameSource;

#[cfg(feature = "leap")]
impl FrameSource for LeapFrameSource {
    fn run(self: Box<Self>, tx: Sender<HandSnapshot>) {
        use leaprs::*;
        use tracing::error;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                error!(error = ?e, "failed to create LeapC connection");
                return;
            }
        };
        if let Err(e) = connection.open() {
            error!(error = ?e, "failed to open LeapMotion device");
            return;
        }
        info!("LeapMotion connected");

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(e) => {
                    debug!(error = ?e, "LeapC poll failed");
                    continue;
                }
            };
            if let Event::Tracking(frame) = msg.event() {
                let mut snap = HandSnapshot::new();
                for hand in frame.hands() {
                    let side = match hand.hand_type() {
                        HandType::Left  => Handedness::Left,
                        HandType::Right => Handedness::Right,
                    };
                    leap::record_hand(&mut snap, side, &hand);
                }
                if tx.send(snap).is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(feature = "leap")]
mod leap {
    use hand_pose::{HandSnapshot, Handedness, JointId, Pose3D};
    use leaprs::{Hand, LeapVector};
    use nalgebra::{Point3, Quaternion, UnitQuaternion};

    const MM_PER_M: f32 = 1000.0;

    fn metres(v: LeapVector) -> Point3<f32> {
        Point3::new(v.x / MM_PER_M, v.y / MM_PER_M, v.z / MM_PER_M)
    }

    /// Joint names for the bone endpoints of one non-thumb digit:
    /// metacarpal base, then each bone's far end.
    const FINGERS: [[JointId; 5]; 4] = [
        [JointId::IndexMetacarpal, JointId::IndexKnuckle, JointId::IndexMiddle,
         JointId::IndexDistal, JointId::IndexTip],
        [JointId::MiddleMetacarpal, JointId::MiddleKnuckle, JointId::MiddleMiddle,
         JointId::MiddleDistal, JointId::MiddleTip],
        [JointId::RingMetacarpal, JointId::RingKnuckle, JointId::RingMiddle,
         JointId::RingDistal, JointId::RingTip],
        [JointId::PinkyMetacarpal, JointId::PinkyKnuckle, JointId::PinkyMiddle,
         JointId::PinkyDistal, JointId::PinkyTip],
    ];

    pub(super) fn record_hand(snap: &mut HandSnapshot, side: Handedness, hand: &Hand) {
        let palm = hand.palm();
        let q = palm.orientation();
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z));
        let mut put = |joint: JointId, v: LeapVector| {
            snap.set(side, joint, Pose3D::new(metres(v), rotation));
        };

        put(JointId::Palm,  palm.position());
        put(JointId::Wrist, hand.arm().next_joint());

        let digits: Vec<_> = hand.digits().collect();
        if digits.len() < 5 {
            return;
        }

        // The thumb's metacarpal has zero length; its proximal bone starts
        // where the other digits' knuckles would be.
        let thumb = &digits[0];
        put(JointId::ThumbMetacarpal, thumb.proximal().prev_joint());
        put(JointId::ThumbProximal,   thumb.proximal().next_joint());
        put(JointId::ThumbDistal,     thumb.intermediate().next_joint());
        put(JointId::ThumbTip,        thumb.distal().next_joint());

        for (digit, joints) in digits[1..].iter().zip(FINGERS.iter()) {
            put(joints[0], digit.metacarpal().prev_joint());
            put(joints[1], digit.proximal().prev_joint());
            put(joints[2], digit.intermediate().prev_joint());
            put(joints[3], digit.distal().prev_joint());
            put(joints[4], digit.distal().next_joint());
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::{JointId, JointProvider};

    fn settings() -> SimSettings {
        SimSettings { seed: Some(7), frame_hz: 200.0, ..SimSettings::default() }
    }

    fn source() -> (Sender<SimInput>, SimFrameSource) {
        let (tx, rx) = mpsc::channel();
        (tx, SimFrameSource::new(rx, &settings()))
    }

    #[test]
    fn both_hands_start_tracked() {
        let (_tx, mut src) = source();
        let snap = src.frame();
        assert!(snap.is_tracked(Handedness::Right));
        assert!(snap.is_tracked(Handedness::Left));
        assert_eq!(snap.tracked_count(Handedness::Right), hand_pose::JOINT_COUNT);
    }

    #[test]
    fn inputs_act_on_the_active_hand() {
        let (_tx, mut src) = source();
        src.apply(SimInput::SwitchHand);
        assert_eq!(src.active(), Handedness::Left);
        src.apply(SimInput::SelectPose(PosePreset::Fist));
        src.apply(SimInput::Move(Vector3::new(0.0, 0.1, 0.0)));
        src.apply(SimInput::TogglePalm);

        assert_eq!(src.hand(Handedness::Left).preset, PosePreset::Fist);
        assert_eq!(src.hand(Handedness::Right).preset, PosePreset::Open);
        assert!((src.hand(Handedness::Left).position.y - 1.3).abs() < 1e-6);

        let snap = src.frame();
        assert!(snap.joint_pose(JointId::Palm, Handedness::Left).is_none());
        assert!(snap.joint_pose(JointId::Palm, Handedness::Right).is_some());
    }

    #[test]
    fn hidden_hand_is_untracked() {
        let (_tx, mut src) = source();
        src.apply(SimInput::ToggleHand);
        assert!(!src.frame().is_tracked(Handedness::Right));
        src.apply(SimInput::ToggleHand);
        assert!(src.frame().is_tracked(Handedness::Right));
    }

    #[test]
    fn extreme_frame_rate_does_not_panic() {
        let (_tx, rx) = mpsc::channel();
        let mut cfg = settings();
        cfg.frame_hz = 1e-20;
        let mut src = SimFrameSource::new(rx, &cfg);
        assert!(src.frame().is_tracked(Handedness::Right));
    }

    #[test]
    fn spawned_source_streams_until_hangup() {
        let (tx, src) = source();
        let frames = spawn_frame_source(src);
        tx.send(SimInput::SelectPose(PosePreset::Point)).unwrap();
        let first = frames.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(first.is_tracked(Handedness::Right));
        drop(tx);
        // The source exits on disconnect, so the stream ends.
        while frames.recv_timeout(Duration::from_secs(2)).is_ok() {}
    }
}

//! # leap_gesture
//!
//! Interactive front-end for [`hand_pose`]: record static hand poses as
//! gesture templates, then watch them being recognised live, with a
//! skeleton visualizer.
//!
//! ## Keys
//!
//! | Key | Action |
//! |---|---|
//! | `Space` | Capture the configured default hand |
//! | `←` | Capture the left hand |
//! | `→` | Capture the right hand |
//! | `P` | Log every tracked joint |
//! | `C` | Clear all templates |
//! | `Q` / `Esc` | Quit (library is saved) |
//!
//! Captures are saved to the template library (`gestures.toml` by default)
//! and reloaded on the next start.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: two synthetic hands driven from the
//!   keyboard.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation keys
//!
//! | Key | Effect on the active simulated hand |
//! |---|---|
//! | `Tab` | Switch between right and left hand |
//! | `1`–`5` | Pose: open, fist, point, victory, thumbs-up |
//! | `W`/`A`/`S`/`D` | Move up / left / down / right |
//! | `R` / `F` | Move toward / away from the viewer |
//! | `Z` / `X` | Twist |
//! | `H` | Hide / show the hand |
//! | `J` | Drop / restore the palm joint |
//!
//! Settings are read from `$LEAP_GESTURE_CONFIG` or `./leap_gesture.toml`;
//! see [`settings`].

pub mod app;
pub mod library;
pub mod settings;
pub mod sim_hand;
pub mod source;
pub mod visualizer;

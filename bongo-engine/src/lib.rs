//! Bongo cat activity animation for split keyboards
//!
//! This crate turns key press/release notifications from the two halves of a
//! split keyboard into the animation frame a status display should show.
//!
//! ```text
//! (position, pressed) ──► ActivityClassifier ──► AnimationEngine ──► FrameTable ──► DisplaySink
//!                                                      ▲
//!                                    TimerDriver ──────┘ (decay to idle)
//! ```
//!
//! The engine state is owned by a single [`SharedEngine`]; both the event path
//! and the timer path go through its lock, so the two sources never race.

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod frames;
pub mod timer;
pub mod widget;

pub use classifier::{ActivityClassifier, ActivitySide, KeyEvent, PressedOrReleased, SplitBoundary};
pub use config::EngineConfig;
pub use engine::{AnimationEngine, AnimationState, DisplayPhase, PhaseSnapshot, StateChange};
pub use error::ConfigError;
pub use frames::{select_frame, AssetId, FrameTable};
pub use timer::TimerDriver;
pub use widget::{AnimationWidget, DisplaySink, SharedEngine};

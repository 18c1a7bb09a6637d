//! # Tinsel
//!
//! A gesture-driven particle tree. Several thousand glowing particles hold a
//! spiral cone (the "assembled" tree) and drift apart into a spherical cloud
//! ("scattered") when the viewer opens their palm in front of a camera, or
//! holds the mouse button when no camera is available.
//!
//! ## Pipeline
//!
//! ```text
//! landmarks ──classify──▶ signal ──▶ ModeState ──▶ MorphDriver ──▶ factor
//!                                        ▲                           │
//!                 manual press/release ──┘        ParticleField ──▶ transform ──▶ GPU
//! ```
//!
//! - [`gesture::classify`] turns one frame of hand landmarks into an
//!   open/closed signal.
//! - [`ModeState`] holds the binary mode and which input owns it.
//! - [`MorphDriver`] eases the blend factor toward the mode's target.
//! - [`ParticleField`] is generated once: two rest positions per particle
//!   plus color, size and a noise seed.
//! - [`transform`] applies blend, float, vortex, pulse and twinkle. The
//!   render shader does the same on the GPU.
//!
//! A decorative [`StarField`](stars::StarField) shell surrounds the tree in
//! the renderer and takes no part in the morph.
//!
//! [`Session`] ties these together with a background landmark
//! [`Detector`](provider::Detector), and [`run`] opens a window around it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tinsel::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     let config = TinselConfig::default().with_seed(7);
//!     let factory: ProviderFactory =
//!         Box::new(|| Box::new(ReplayProvider::new("hands.jsonl")) as Box<dyn LandmarkProvider>);
//!     tinsel::run(config, Some(factory))
//! }
//! ```
//!
//! Without a window, the same pieces run headless:
//!
//! ```ignore
//! let mut session = Session::new(&TinselConfig::default(), None);
//! session.press();
//! let frame = session.frame(1.0 / 60.0);
//! let buffers = transform(session.field(), frame.morph_factor, frame.elapsed);
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod field;
pub mod gesture;
pub mod gpu;
pub mod input;
pub mod landmarks;
pub mod mode;
pub mod morph;
pub mod noise;
pub mod provider;
pub mod session;
pub mod shader;
pub mod stars;
pub mod time;
pub mod transform;

pub use app::run;
pub use config::TinselConfig;
pub use error::{AppError, ConfigError, GpuError, ProviderError};
pub use field::{Category, ParticleField};
pub use gesture::{classify, InteractionSignal};
pub use landmarks::{Landmark, LandmarkSet};
pub use mode::{ControlSource, InteractionMode, ManualSignal, ModeState};
pub use morph::MorphDriver;
pub use session::{ControlStatus, FrameState, ProviderFactory, Session};
pub use transform::{transform, RenderBuffers};

pub use glam::{Vec2, Vec3};

/// Common imports.
pub mod prelude {
    pub use crate::config::TinselConfig;
    pub use crate::error::{AppError, ConfigError, ProviderError};
    pub use crate::field::ParticleField;
    pub use crate::gesture::{classify, InteractionSignal};
    pub use crate::landmarks::{Landmark, LandmarkSet};
    pub use crate::mode::{InteractionMode, ManualSignal};
    pub use crate::morph::MorphDriver;
    pub use crate::provider::{
        LandmarkProvider, ReplayProvider, ScriptedProvider, UnavailableProvider,
    };
    pub use crate::session::{ControlStatus, FrameState, ProviderFactory, Session};
    pub use crate::transform::{transform, RenderBuffers};
    pub use glam::Vec3;
}

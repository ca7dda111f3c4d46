//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One call to `tick` per display frame
//! - Seeded RNG only
//! - No rendering, audio or storage; collaborators are reached through `FrameHooks`

pub mod charge;
pub mod cinematic;
pub mod decay;
pub mod events;
pub mod input;
pub mod landing;
pub mod physics;
pub mod precision;
pub mod rings;
pub mod stamina;
pub mod state;
pub mod tick;
pub mod tutorial;

pub use cinematic::{Cinematic, decimal_places};
pub use decay::Decaying;
pub use events::{FrameHooks, OutcomeEvent, RecordingHooks};
pub use input::{BufferedKind, InputBuffer, PrecisionInput};
pub use landing::{FailureAnimation, NearMiss, NearMissIntensity};
pub use stamina::{ActionResult, edge_multiplier};
pub use state::{
    DailyStats, FailureKind, Progress, SessionState, Stats, ThrowOutcome, ThrowPhase,
};
pub use tick::{FrameInput, tick};
pub use tutorial::TutorialKind;

//! Provider adapters for the external generation APIs.
//!
//! Each adapter implements the `GenerationProvider` port for one service:
//! submit a job, then poll its status endpoint. The shared loop in
//! [`polling`] drives every provider to a terminal state; the adapters
//! themselves only translate wire shapes and status vocabularies.

pub mod polling;

mod http;
mod music;
mod slides;
mod speech;
mod video;

pub use music::{MusicConfig, MusicProvider};
pub use polling::{poll_until_done, PollOptions};
pub use slides::{SlidesConfig, SlidesProvider};
pub use speech::{SpeechConfig, SpeechProvider};
pub use video::{VideoConfig, VideoProvider};

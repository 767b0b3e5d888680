//! GenStudio - Generative Media Backend
//!
//! Tier resolution, usage quota enforcement, and generation orchestration
//! against external media providers (video, speech, music, slides).

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

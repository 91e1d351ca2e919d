//! # Lyricloud Common Library
//!
//! Shared code for the lyricloud services:
//! - Error type and result alias
//! - TOML bootstrap configuration with graceful degradation
//! - Event types (LyricloudEvent enum) and the broadcast EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};

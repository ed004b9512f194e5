//! Core components, types, and utilities for the iasip-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Social network and pipeline types, plus result aliases.
//! - HTML to plain text reduction for status content.

pub mod config;
pub mod html;
pub mod types;

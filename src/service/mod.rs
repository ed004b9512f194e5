//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the iasip-bot:
//! - Social network services (e.g., Mastodon)
//! - Image generators (e.g., title cards)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod generator;
pub mod social;

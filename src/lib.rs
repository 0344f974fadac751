//! Fit Onboard: step-flow onboarding engine for a fitness coaching app.

pub mod catalog;
pub mod config;
pub mod error;
pub mod hydration;
pub mod onboarding;
pub mod store;

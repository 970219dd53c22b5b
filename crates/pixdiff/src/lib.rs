//! Compare an image against its own earlier version.
//!
//! The previous version is read from git history ([`history`]), both sides
//! are decoded ([`codec`]), padded to a common canvas ([`normalize`]) and
//! compared pixel by pixel ([`diff`]). [`compare`] ties the stages together
//! and degrades to a partial result instead of failing.

pub mod codec;
pub mod compare;
pub mod config;
pub mod diff;
pub mod history;
pub mod normalize;

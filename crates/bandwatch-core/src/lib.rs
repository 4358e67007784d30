//! Core logic for the Bandwatch modem agent.
//!
//! This crate contains:
//! - **Band codec** — selection expressions ⇔ the device's hex band bitmask
//! - **Cell identity** — eNB id decoding and PLMN normalization
//! - **Telemetry windows** — fixed-capacity, newest-first chart windows
//! - **Snapshot models** — the presentation types the panel layer consumes
//!
//! Everything here is pure computation; all device I/O lives in
//! `bandwatch-agent`.

pub mod band;
pub mod cell;
pub mod snapshot;
pub mod window;

//! Tick-stream view projection layer for interactive simulation UIs.
//!
//! An external simulation engine emits one record per tick, either a full
//! snapshot or a sparse patch. This crate reconciles that stream into stable,
//! typed, incrementally-updated view objects; offers an independent ad-hoc
//! time-series "lens" over arbitrary numeric channels; and manages renderable
//! graph runs, including freezing one run as a baseline to compare against a
//! variant.
//!
//! The engine and the pixel renderer are external collaborators: this crate
//! consumes [`tick::TickRecord`]s and produces the normalized view objects in
//! [`view`], plus a viewport transform and a compare status. Everything hangs
//! off one explicit [`context::ProjectionContext`]; there are no globals.

pub mod context;
pub mod lens;
pub mod overlay;
pub mod patch;
pub mod render;
pub mod store;
pub mod sweep;
pub mod tick;
pub mod view;

pub type Result<T> = anyhow::Result<T>;

//! Detection pipeline.
//!
//! Glue layer wiring the stages together in call order:
//! histogram spikes -> masks/edges -> (warm start) -> contour segments ->
//! seeds -> merge search -> candidate selection -> refit.
//!
//! Algorithmic primitives live in `crate::preprocess`, `crate::contour`,
//! `crate::seed`, `crate::search` and `crate::select`. This layer owns ROI
//! handling, coordinate translation, state updates and overlay drawing.

mod result;
mod run;

pub use result::{DetectionOutcome, PupilDetection, Roi};

pub(crate) use run::run;

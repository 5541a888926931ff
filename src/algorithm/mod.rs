//! Algorithm implementations for cohort construction
//!
//! This module contains the temporal matching engine, which decides per patient whether
//! a constraint holds, and the cohort layer that groups events by patient and combines
//! the per-criterion patient sets.

pub mod cohort;
pub mod matching;

//! Severity grading for sites.
//!
//! 1 is harmless, 2 deserves a look, 3 is a likely performance problem.

use crate::parser::events::{BailoutType, IcState, OptimizationState};

pub const SEVERITY_LOW: u8 = 1;
pub const SEVERITY_MEDIUM: u8 = 2;
pub const SEVERITY_HIGH: u8 = 3;

/// Severity of an inline cache after a transition
pub fn ic_severity(state: &IcState) -> u8 {
    match state {
        IcState::Polymorphic => SEVERITY_MEDIUM,
        IcState::Megamorphic | IcState::Megadom | IcState::Generic => SEVERITY_HIGH,
        IcState::Uninitialized
        | IcState::Premonomorphic
        | IcState::Monomorphic
        | IcState::RecomputeHandler
        | IcState::NoFeedback
        | IcState::Other(_) => SEVERITY_LOW,
    }
}

/// Severity of a deoptimization
pub fn deopt_severity(bailout: &BailoutType) -> u8 {
    match bailout {
        BailoutType::Soft => SEVERITY_LOW,
        BailoutType::Lazy => SEVERITY_MEDIUM,
        BailoutType::Eager | BailoutType::Other(_) => SEVERITY_HIGH,
    }
}

/// Severity of a code object's tier
pub fn code_severity(state: OptimizationState) -> u8 {
    match state {
        OptimizationState::Optimized | OptimizationState::Maglev => SEVERITY_LOW,
        OptimizationState::Baseline | OptimizationState::Interpreted => SEVERITY_MEDIUM,
        OptimizationState::Compiled => SEVERITY_HIGH,
    }
}

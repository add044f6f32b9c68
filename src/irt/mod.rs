//! Computerized adaptive testing core: 3PL ability estimation, maximum
//! information item selection, and the session stopping rule.

pub mod estimator;
pub mod selector;
pub mod stopping;

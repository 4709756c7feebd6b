//! Library side of the `xbrl-diag` binary.

pub mod coverage;
pub mod inputs;
pub mod logging;
pub mod routing;

//! Configuration errors raised by the generator
//!
//! Only configuration-class problems surface as errors. Data-shape and
//! insufficient-data conditions are logged and degrade gracefully instead.

use thiserror::Error;

/// Hard cap on servers of a single class in one roster
pub const MAX_SERVERS_PER_CLASS: usize = 50;

/// Errors returned by roster, schedule, synthesis and interpolation entry points
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("roster is empty: at least one server class needs a non-zero count")]
    EmptyRoster,

    #[error("too many {class} servers requested: {count} (max {max})")]
    TooManyServers {
        class: String,
        count: usize,
        max: usize,
    },

    #[error("simulation horizon must contain at least one time-point")]
    ZeroHorizon,

    #[error("sampling interval must be at least one minute")]
    ZeroInterval,

    #[error("failure schedule references unknown server '{0}'")]
    UnknownServer(String),

    #[error("failure event starting at {start} with {duration} points exceeds horizon {horizon}")]
    EventOutOfHorizon {
        start: usize,
        duration: usize,
        horizon: usize,
    },

    #[error("invalid option {name}={value}: {reason}")]
    InvalidOption {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, SimError>;

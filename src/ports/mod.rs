//! Port traits: the boundary between the scoring core and its collaborators.

pub mod config_port;
pub mod data_port;
pub mod report_port;

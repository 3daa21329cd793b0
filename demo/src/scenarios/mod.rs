//! Scripted walkthroughs of the gateway, one module per theme.

pub mod admission;
pub mod claims;
pub mod elevation_outage;

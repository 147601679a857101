//! Types shared between the FuelTime service and its clients.

pub mod model;
pub mod responses;

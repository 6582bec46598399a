//! Client for the SunWEG photovoltaic monitoring API.

pub mod api;
pub mod model;
pub mod numeric;

pub use api::Error;

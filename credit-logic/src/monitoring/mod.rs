pub mod calibration;
pub mod demo;
pub mod monitoring_service_impl;
pub mod psi;
pub mod vintage;

pub use calibration::*;
pub use monitoring_service_impl::*;
pub use psi::*;
pub use vintage::*;

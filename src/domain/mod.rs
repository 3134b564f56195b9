// Domain layer: constraint models and the service port. No I/O here.

pub mod model;
pub mod ports;

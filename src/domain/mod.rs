// Domain layer: models and ports. Concrete storage/sources live in adapters and config.

pub mod model;
pub mod ports;

// Domain layer: signal model and the broker port. No transport code here.

pub mod model;
pub mod ports;

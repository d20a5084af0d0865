//! Domain layer: payload models, value objects, webhook events and ports.
pub mod aggregates;
pub mod events;
pub mod ports;
pub mod sanitizer;
pub mod value_objects;

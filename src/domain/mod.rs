//! Domain model: cart, draft order, pricing and checkout events.
pub mod aggregates;
pub mod events;
pub mod pricing;
pub mod value_objects;

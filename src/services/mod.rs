// Location directory: actor -> location resolution and validation
pub mod locations;

// Stock order store: persistence plus invariant enforcement
pub mod stock_orders;

// Request gateway: one logical operation per call
pub mod transfers;

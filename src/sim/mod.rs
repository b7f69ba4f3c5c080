/// Action encoding and the flat action index.
pub mod action;
pub mod controller;
pub mod engine;
/// Grid price lookup and settlement.
pub mod grid;
pub mod kpi;
pub mod observation;
pub mod recorder;
pub mod types;

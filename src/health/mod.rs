//! Pre-flight health gate
//!
//! Decides whether the graph server can safely accept another bulk load right
//! now. The gate is advisory: a healthy verdict does not guarantee the load
//! succeeds, it only keeps obviously doomed loads off a struggling server.

mod gate;

pub use gate::{HealthGate, HealthVerdict};

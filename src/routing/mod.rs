//! Request routing
//!
//! Two independent outputs: a [`DispatchPlan`] naming which agents should
//! handle a request, and a [`FallbackDecision`] saying how much to trust
//! acting on it automatically.

mod decision;
mod router;

pub use decision::{FallbackDecision, FallbackOptions, Route, RouteDecision};
pub use router::{
    tokenize, AgentPlanEntry, DispatchPlan, RouteRequest, Router, NO_MATCH_REASON,
};

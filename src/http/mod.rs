//! Axum adapter layer: layered input extraction and the two response
//! strategies (direct response, forward-to-next-stage).

mod extract;
mod handlers;

pub use extract::{build_input, FlowContext, FlowOutcome};
pub use handlers::{
    complete_activate, complete_cafe_auth, complete_cafe_reset, complete_password_reset,
    create_activate, create_cafe_auth, create_cafe_reset, create_password_reset, emit_outcome,
    forward, respond, FlowRoute,
};

// Generate and accept workflows.
// The completion call goes through llm_client; persistence through session.

pub mod accept;
pub mod display;
pub mod generator;
pub mod handlers;
pub mod prompts;

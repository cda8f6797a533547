// Agent pipeline: prompt construction, the HTTP client for the external
// agent service, result projection, and the trigger service that ties them
// together with an execution audit trail.

pub mod client;
pub mod dispatcher;
pub mod handlers;
pub mod kind;
pub mod prompts;
pub mod trigger;

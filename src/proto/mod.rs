//! Contract shared by the normal-world harness and the trusted application.

pub mod command;
pub mod status;
pub mod wire;

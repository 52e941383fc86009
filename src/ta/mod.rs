//! Secure-world side: the trusted application and the hardware it reads.

pub mod handler;
pub mod peripheral;

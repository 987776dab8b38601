//! Wire types shared by the cinema workflow client and its front ends.

pub mod domain;
pub mod error;
pub mod protocol;

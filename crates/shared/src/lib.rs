//! Wire and domain types shared by the Postlify cache, client and front end.

pub mod domain;
pub mod error;
pub mod protocol;

//! Digest token generation and validation for Edge Auth.
//!
//! Create and verify the signed, time-bound `DIGEST:` tokens used to grant scoped access
//! to streams, channels and rooms at the edge of a real-time media platform.
//! The encoding is shared with every other Edge Auth implementation, so a token issued here
//! verifies anywhere else and vice versa.
//!
//! See [`TokenBuilder`] for issuing tokens and [`DigestTokens`] for the wire format.

mod builder;
mod digest;
mod error;
mod token;
mod tokens;

pub use builder::*;
pub use digest::*;
pub use error::*;
pub use token::*;
pub use tokens::*;

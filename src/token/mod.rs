pub mod expiration;
pub mod token;

pub use expiration::{parse_expires_in, parse_expires_in_str, ExpirationTime};
pub use token::{RawFields, Token};

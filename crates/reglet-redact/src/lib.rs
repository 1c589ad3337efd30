//! Secret redaction: regex scrubbing, path-based masking, and HMAC
//! correlation hashes.

pub mod hex;
pub mod patterns;
pub mod redactor;
pub mod writer;

pub use redactor::{Config, Redactor};
pub use writer::RedactingWriter;

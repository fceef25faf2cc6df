pub mod block;
pub mod canonicalize;
pub mod hashes;
pub mod merkle;
pub mod serve;
pub mod submit;
pub mod validate;

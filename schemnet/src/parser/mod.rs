pub mod document;
pub mod sexp;

pub use document::{ParseError, SchematicDoc};
pub use sexp::{Sexp, SexpError};

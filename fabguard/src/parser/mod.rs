pub mod board;
pub mod sexp;

pub use board::{BoardParseError, BoardParser};
pub use sexp::{ParseError, SExp, SExpParser};

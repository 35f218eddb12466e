pub mod error;
pub mod types;
pub mod value;

pub use error::{DialogError, ErrorKind};
pub use types::*;
pub use value::*;

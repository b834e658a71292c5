//! Small value types shared by the model, the differ and the editor.

mod id;
mod non_empty;
mod value;

pub use id::{ElementId, EmptyIdError};
pub use non_empty::NonEmptyVec;
pub use value::AttributeValue;

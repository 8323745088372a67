pub mod bindings;
pub mod function_locator;

pub use bindings::{BindingList, DestructureBinding};
pub use function_locator::*;

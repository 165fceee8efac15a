pub mod attrs;
pub mod builder;
pub mod error;
pub mod marshal;
pub mod node;

pub use attrs::AttrParser;
pub use error::{Result, XmlError};
pub use marshal::{is_valid_name, marshal, unmarshal};
pub use node::{Attrs, Node, NodeContent};

//! DTE XML normalization: tolerant parsing of Chilean electronic tax
//! documents into [`crate::models::DocumentRecord`].

mod parser;
mod tree;

pub use parser::parse_dte;
pub use tree::{find_node, parse_tree, XmlValue};

//! Template input tree

pub mod code_block;
pub mod html;
pub mod nodes;

pub use code_block::{BoundParams, CodeBlockKind, CodeBlockNode};
pub use nodes::{
    CallCommand, CommandNode, ElementNode, ForCommand, IfCommand, Node, PartCommand, TextNode,
    ViewCommand, XorCommand,
};

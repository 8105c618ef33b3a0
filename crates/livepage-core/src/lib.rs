pub mod color;
pub mod css;
pub mod dom;
pub mod emitter;
pub mod hit;
pub mod id;
pub mod layout;
pub mod parser;

pub use color::Color;
pub use css::{ComputedStyle, Declaration, Stylesheet, compute_style, parse_stylesheet};
pub use dom::{Attribute, Document, Element, ElementRef, Node};
pub use emitter::{EmitOptions, emit_children, emit_document};
pub use hit::hit_test;
pub use id::Tag;
pub use layout::{Layout, LayoutBox, Viewport, resolve_layout};
pub use parser::parse_document;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;

//! Selection modes and movement resolution.
//!
//! A [`SelectionMode`] decides what the addressable units of a buffer are
//! (graphemes, casing words, lines, tokens, syntax nodes, search hits, marks,
//! LSP locations). [`resolve`] maps an abstract [`Movement`] onto the mode for one
//! selection and answers with a [`Resolution`]. Nothing here mutates state.

mod candidates;
mod error;
mod lexer;
mod mode;
mod movement;
mod resolver;
mod selection;
mod structural;
mod words;

pub use candidates::{Candidate, Candidates};
pub use error::{EngineError, ModeError};
pub use mode::{
    ModeKind, ModeSpec, SearchPattern, SearchScope, SelectionMode, WrapPolicy, naming_variants,
};
pub use movement::Movement;
pub use resolver::{Resolution, ResolveContext, all_candidates, resolve};
pub use selection::{Selection, SelectionInfo};

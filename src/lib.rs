//! chatweave
//!
//! Terminal chat client core: a streaming `<think>` tag parser, a
//! multi-stream message accumulator, and an interactive node tree rendered
//! with ratatui.
//!
//! Pure core (`model`, `parser`, `accumulator`, `view_state`, `state`)
//! surrounded by an impure shell (`source`, `view`, `logging`, `config`).

pub mod accumulator;
pub mod config;
pub mod logging;
pub mod model;
pub mod parser;
pub mod source;
pub mod state;
pub mod view;
pub mod view_state;

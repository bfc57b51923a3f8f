//! Validation rules, one file per block kind:
//!
//! - `load_block.rs` - `load <driver>:<path>` headers
//! - `fn_block.rs` - `fn` alias blocks and their nested `args`
//! - `run_block.rs` - the three `run` forms

mod fn_block;
mod load_block;
mod run_block;

pub use fn_block::FnBlockRule;
pub use load_block::LoadBlockRule;
pub use run_block::RunBlockRule;

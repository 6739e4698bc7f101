//! CLI command implementations.

pub mod title;
pub mod top;

pub use title::TitleCommand;
pub use top::TopCommand;

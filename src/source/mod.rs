pub mod file;
pub mod grid;
pub mod provider;

pub use file::FileSource;
pub use grid::GridSource;
pub use provider::PayloadSource;

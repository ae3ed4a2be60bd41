//! Command implementations behind the `pwshfind` binary.

mod first;
mod fix_path;
mod list;

pub use first::first;
pub use fix_path::fix_path;
pub use list::list;

pub mod size;
pub mod tree;
pub mod watcher;

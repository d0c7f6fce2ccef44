pub mod mounts;
pub mod probe;

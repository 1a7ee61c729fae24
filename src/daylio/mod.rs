pub mod archive;
pub mod backup;
pub mod model;

pub mod artifact;
pub mod detection;
pub mod errors;
pub mod media;
pub mod model;

pub mod location;
pub mod species;
pub mod weather;

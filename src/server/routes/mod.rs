pub mod address;
pub mod token;

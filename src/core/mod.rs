pub mod catalog;
pub mod codec;
pub mod grammar;
pub mod model;

pub mod import;
pub mod registry;

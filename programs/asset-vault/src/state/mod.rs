pub mod vault_data;

pub use vault_data::*;

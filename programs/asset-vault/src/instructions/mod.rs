pub mod deposit_tokens;
pub mod initialize_vault;
pub mod withdraw_tokens;

pub use deposit_tokens::*;
pub use initialize_vault::*;
pub use withdraw_tokens::*;

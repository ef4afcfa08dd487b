mod error;
mod executor;
mod fs_utils;
mod layout;
mod receipts;
mod store;

pub use error::ActionError;
pub use executor::ActionExecutor;
pub use layout::{default_user_prefix, PrefixLayout};
pub use receipts::{read_install_receipts, write_install_receipt, InstallReceipt};
pub use store::{InstallStore, ReceiptStore};

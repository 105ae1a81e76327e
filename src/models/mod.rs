mod account;
mod product;

pub use account::{
    Account, AccountRecord, EMAIL_CONFIRMATION_VALIDITY, PASSWORD_RESET_VALIDITY, PendingToken,
    Role, StatusChange, TokenPurpose,
};
pub use product::{
    NewProduct, Product, ProductChangeset, ProductRecord, ProductUpdate, VisibilityMode,
};

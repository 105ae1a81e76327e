//! Outbound calls to other services.

pub mod client;
pub mod product_visibility;

#[cfg(test)]
pub use product_visibility::MockProductVisibilityClient;
pub use product_visibility::{
    HttpVisibilityClient, INTERNAL_API_KEY_HEADER, ProductVisibilityClient, VisibilityOutcome,
};

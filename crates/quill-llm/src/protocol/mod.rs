//! Wire format types for provider-specific API protocols
//!
//! Each module contains pure serde structs matching the respective provider's
//! JSON API format. They only exist at the HTTP boundary.

pub mod anthropic;
pub mod google;
pub mod openai;

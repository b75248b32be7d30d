//! Platform Domain
//!
//! Content and support features administered by moderators:
//!
//! - **Policy**: public documents such as terms of use, privacy and refund
//!   policies, addressed by a URL slug
//! - **SupportQuery**: a request raised through the contact form, resolved
//!   by a moderator with a written response

pub mod policy;
pub mod query;
pub mod ports;
pub mod error;

pub use policy::Policy;
pub use query::{QueryStatus, SupportQuery};
pub use ports::{PolicyPort, QueryPort};
pub use error::PlatformError;

pub mod admin_helpers;
pub mod content_helpers;
pub mod public_helpers;

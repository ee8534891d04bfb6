pub mod root;
pub mod sign_message;

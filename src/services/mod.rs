pub mod ai;
pub mod booking;
pub mod conversation;
pub mod messaging;
pub mod tools;
pub mod transcripts;

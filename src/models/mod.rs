pub mod booking;
pub mod conversation;
pub mod message;

pub use booking::{Booking, BookingStatus, Customer, Service, Staff};
pub use conversation::{ConversationContext, Transcript};
pub use message::{ChatMessage, Completion, FunctionCall, Role, ToolCallRequest};

pub mod conversation;
pub mod tool_events;
pub mod tool_loop;

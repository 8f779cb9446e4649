mod chat;
mod progress;

pub use chat::*;
pub use progress::*;

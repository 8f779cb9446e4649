pub mod conversation;
pub mod lesson;
pub mod message;
pub mod progress;

pub use conversation::{ChatHistory, Conversation};
pub use lesson::Lesson;
pub use message::{Message, Role};
pub use progress::{LessonProgress, ProgressStats};

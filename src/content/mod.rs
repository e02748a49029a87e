//! Content records: the tests, questions and tasks students practice with,
//! and the submissions they produce.

mod records;
mod store;

pub mod samples;

pub use records::{
    Category, ListeningPart, ListeningTest, ReadingTest, SpeakingQuestion, SpeakingSubmission,
    SpeakingTest, WritingSubmission, WritingTask, WritingTaskType,
};
pub use store::ContentStore;

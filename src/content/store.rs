use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::records::{
    Category, ListeningTest, ReadingTest, SpeakingQuestion, SpeakingSubmission, SpeakingTest,
    WritingSubmission, WritingTask,
};

/// In-memory content store.
///
/// One map per record family, each behind its own lock. Durable persistence
/// is delegated to the hosted database; this store backs local deployments
/// and tests, and defines the access surface a hosted implementation would
/// fill in.
#[derive(Default)]
pub struct ContentStore {
    speaking_tests: RwLock<HashMap<Uuid, SpeakingTest>>,
    speaking_questions: RwLock<HashMap<Uuid, SpeakingQuestion>>,
    writing_tasks: RwLock<HashMap<Uuid, WritingTask>>,
    listening_tests: RwLock<HashMap<Uuid, ListeningTest>>,
    reading_tests: RwLock<HashMap<Uuid, ReadingTest>>,
    speaking_submissions: RwLock<HashMap<Uuid, SpeakingSubmission>>,
    writing_submissions: RwLock<HashMap<Uuid, WritingSubmission>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Speaking tests =====

    pub async fn insert_speaking_test(&self, test: SpeakingTest) {
        self.speaking_tests.write().await.insert(test.id, test);
    }

    pub async fn speaking_test(&self, id: Uuid) -> Option<SpeakingTest> {
        self.speaking_tests.read().await.get(&id).cloned()
    }

    pub async fn list_speaking_tests(&self) -> Vec<SpeakingTest> {
        let mut tests: Vec<_> = self.speaking_tests.read().await.values().cloned().collect();
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tests
    }

    pub async fn delete_speaking_test(&self, id: Uuid) -> bool {
        self.speaking_tests.write().await.remove(&id).is_some()
    }

    // ===== Speaking questions =====

    pub async fn insert_speaking_question(&self, question: SpeakingQuestion) {
        self.speaking_questions
            .write()
            .await
            .insert(question.id, question);
    }

    pub async fn speaking_question(&self, id: Uuid) -> Option<SpeakingQuestion> {
        self.speaking_questions.read().await.get(&id).cloned()
    }

    pub async fn list_speaking_questions(
        &self,
        category: Option<Category>,
        part: Option<u8>,
    ) -> Vec<SpeakingQuestion> {
        let mut questions: Vec<_> = self
            .speaking_questions
            .read()
            .await
            .values()
            .filter(|q| category.map_or(true, |c| q.category == c))
            .filter(|q| part.map_or(true, |p| q.part == p))
            .cloned()
            .collect();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        questions
    }

    pub async fn delete_speaking_question(&self, id: Uuid) -> bool {
        self.speaking_questions.write().await.remove(&id).is_some()
    }

    // ===== Writing tasks =====

    pub async fn insert_writing_task(&self, task: WritingTask) {
        self.writing_tasks.write().await.insert(task.id, task);
    }

    pub async fn writing_task(&self, id: Uuid) -> Option<WritingTask> {
        self.writing_tasks.read().await.get(&id).cloned()
    }

    pub async fn list_writing_tasks(&self, category: Option<Category>) -> Vec<WritingTask> {
        let mut tasks: Vec<_> = self
            .writing_tasks
            .read()
            .await
            .values()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    pub async fn delete_writing_task(&self, id: Uuid) -> bool {
        self.writing_tasks.write().await.remove(&id).is_some()
    }

    // ===== Listening tests =====

    pub async fn insert_listening_test(&self, test: ListeningTest) {
        self.listening_tests.write().await.insert(test.id, test);
    }

    pub async fn listening_test(&self, id: Uuid) -> Option<ListeningTest> {
        self.listening_tests.read().await.get(&id).cloned()
    }

    pub async fn list_listening_tests(&self) -> Vec<ListeningTest> {
        let mut tests: Vec<_> = self
            .listening_tests
            .read()
            .await
            .values()
            .cloned()
            .collect();
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tests
    }

    pub async fn delete_listening_test(&self, id: Uuid) -> bool {
        self.listening_tests.write().await.remove(&id).is_some()
    }

    // ===== Reading tests =====

    pub async fn insert_reading_test(&self, test: ReadingTest) {
        self.reading_tests.write().await.insert(test.id, test);
    }

    pub async fn reading_test(&self, id: Uuid) -> Option<ReadingTest> {
        self.reading_tests.read().await.get(&id).cloned()
    }

    pub async fn list_reading_tests(&self, category: Option<Category>) -> Vec<ReadingTest> {
        let mut tests: Vec<_> = self
            .reading_tests
            .read()
            .await
            .values()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .cloned()
            .collect();
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tests
    }

    pub async fn delete_reading_test(&self, id: Uuid) -> bool {
        self.reading_tests.write().await.remove(&id).is_some()
    }

    // ===== Submissions =====

    pub async fn insert_speaking_submission(&self, submission: SpeakingSubmission) {
        self.speaking_submissions
            .write()
            .await
            .insert(submission.id, submission);
    }

    pub async fn list_speaking_submissions(&self) -> Vec<SpeakingSubmission> {
        let mut submissions: Vec<_> = self
            .speaking_submissions
            .read()
            .await
            .values()
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        submissions
    }

    pub async fn insert_writing_submission(&self, submission: WritingSubmission) {
        self.writing_submissions
            .write()
            .await
            .insert(submission.id, submission);
    }

    pub async fn list_writing_submissions(&self) -> Vec<WritingSubmission> {
        let mut submissions: Vec<_> = self
            .writing_submissions
            .read()
            .await
            .values()
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        submissions
    }
}

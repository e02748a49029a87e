//! Built-in practice content, for local runs and demos.

use chrono::Utc;
use uuid::Uuid;

use super::records::{Category, SpeakingQuestion, SpeakingTest, WritingTask, WritingTaskType};
use super::store::ContentStore;

pub fn sample_speaking_test() -> SpeakingTest {
    SpeakingTest {
        id: Uuid::new_v4(),
        title: "Hometown and a memorable journey".to_string(),
        intro_questions: vec![
            "Let's talk about your hometown. Where is it, and what is it known for?".to_string(),
            "Do you work or are you a student?".to_string(),
            "What do you enjoy most about your work or studies?".to_string(),
            "How do you usually spend your weekends?".to_string(),
            "Do you prefer spending time indoors or outdoors? Why?".to_string(),
            "Has the way you spend your free time changed in recent years?".to_string(),
        ],
        cue_card: "Describe a journey that you remember well.\n\nYou should say:\n- where you went\n- how you travelled\n- who you were with\nand explain why you remember this journey so well.".to_string(),
        followup_questions: vec![
            "Why do you think some journeys stay in our memory?".to_string(),
            "How has travel changed compared with a few decades ago?".to_string(),
            "Do you think people rely too much on cars these days?".to_string(),
            "What are the benefits of travelling to unfamiliar places?".to_string(),
            "Will people travel more or less in the future, in your view?".to_string(),
        ],
        created_at: Utc::now(),
    }
}

pub fn sample_speaking_questions() -> Vec<SpeakingQuestion> {
    vec![
        SpeakingQuestion {
            id: Uuid::new_v4(),
            category: Category::Academic,
            part: 1,
            question_text: "Do you enjoy reading? What kind of books do you usually read?"
                .to_string(),
            cue_card: None,
            created_at: Utc::now(),
        },
        SpeakingQuestion {
            id: Uuid::new_v4(),
            category: Category::Academic,
            part: 2,
            question_text: "Describe a book that made a strong impression on you.".to_string(),
            cue_card: Some(
                "You should say:\n- what the book was about\n- when you read it\n- why you chose it\nand explain what impression it made on you."
                    .to_string(),
            ),
            created_at: Utc::now(),
        },
        SpeakingQuestion {
            id: Uuid::new_v4(),
            category: Category::General,
            part: 3,
            question_text: "Do you think printed books will disappear in the future?".to_string(),
            cue_card: None,
            created_at: Utc::now(),
        },
    ]
}

pub fn sample_writing_tasks() -> Vec<WritingTask> {
    vec![
        WritingTask {
            id: Uuid::new_v4(),
            category: Category::Academic,
            task_type: WritingTaskType::Task1,
            question_text: "The chart below shows household recycling rates in three countries between 2005 and 2020. Summarise the information by selecting and reporting the main features, and make comparisons where relevant.".to_string(),
            image_url: None,
            created_at: Utc::now(),
        },
        WritingTask {
            id: Uuid::new_v4(),
            category: Category::General,
            task_type: WritingTaskType::Task2,
            question_text: "Some people believe that unpaid community service should be a compulsory part of high school programmes. To what extent do you agree or disagree?".to_string(),
            image_url: None,
            created_at: Utc::now(),
        },
    ]
}

/// Load the sample content into a store.
pub async fn seed(store: &ContentStore) {
    store.insert_speaking_test(sample_speaking_test()).await;
    for question in sample_speaking_questions() {
        store.insert_speaking_question(question).await;
    }
    for task in sample_writing_tasks() {
        store.insert_writing_task(task).await;
    }
}

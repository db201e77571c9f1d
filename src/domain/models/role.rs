#[cfg(test)]
#[path = "role_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;

/// Audience segment a conversation is tailored to.
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    EnumVariantNames,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Student,
    Teacher,
    Parent,
    General,
}

const STUDENT_PROMPTS: &[&str] = &[
    "How do I check my admission status?",
    "Where can I download my hall ticket?",
    "How do I apply for a scholarship?",
    "When are the exam results published?",
    "How do I update my personal details?",
];

const TEACHER_PROMPTS: &[&str] = &[
    "How do I upload student attendance?",
    "Where do I enter internal assessment marks?",
    "How do I update my faculty profile?",
    "How do I request a change to a timetable?",
];

const PARENT_PROMPTS: &[&str] = &[
    "How can I see my child's attendance?",
    "Where can I find the fee payment schedule?",
    "How do I contact my child's institute?",
    "When are the exam results published?",
];

// Mirrors the questions the assistant service answers without calling the
// language model.
const GENERAL_PROMPTS: &[&str] = &[
    "What is DTE EMIS?",
    "How do I log in to DTE EMIS?",
    "Where can I find the user manual?",
    "Who can I contact for support?",
    "What is the official website for DTE EMIS?",
];

impl Role {
    pub fn presets(&self) -> &'static [&'static str] {
        match self {
            Role::Student => return STUDENT_PROMPTS,
            Role::Teacher => return TEACHER_PROMPTS,
            Role::Parent => return PARENT_PROMPTS,
            Role::General => return GENERAL_PROMPTS,
        }
    }

    /// Lenient parse used for values coming back from the assistant service,
    /// where anything unrecognised means no role.
    pub fn detect(value: &str) -> Option<Role> {
        return value.trim().parse::<Role>().ok();
    }
}

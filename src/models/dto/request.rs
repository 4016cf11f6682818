use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Clients send ids either as JSON numbers or as strings, with `""` meaning "none".
#[derive(Deserialize)]
#[serde(untagged)]
enum IdOrText {
    Id(i64),
    Text(String),
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdOrText::Id(id)) => Ok(Some(id)),
        Some(IdOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(IdOrText::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("'{}' is not a valid id", text))),
    }
}

fn deserialize_group_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdOrText>::deserialize(deserializer)? {
        None => Ok(String::new()),
        Some(IdOrText::Id(id)) => Ok(id.to_string()),
        Some(IdOrText::Text(text)) => Ok(text.trim().to_string()),
    }
}

/// Where the lecture text for generation comes from: uploaded files and/or a recording transcript.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SourceSelection {
    #[serde(default)]
    pub file_ids: Vec<i64>,

    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub media_id: Option<i64>,
}

impl SourceSelection {
    pub fn is_empty(&self) -> bool {
        self.file_ids.is_empty() && self.media_id.is_none()
    }
}

pub type GenerateQuizRequest = SourceSelection;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegenerateQuizRequest {
    #[serde(default, deserialize_with = "deserialize_group_id")]
    #[validate(length(min = 1, message = "group_id must not be empty"))]
    pub group_id: String,

    #[serde(flatten)]
    pub sources: SourceSelection,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PublishQuizzesRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "quiz_ids must not be empty"))]
    pub quiz_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[serde(default)]
    pub answer: Option<String>,

    #[serde(default, rename = "selectedOption", alias = "selected_option")]
    pub selected_option: Option<String>,

    #[serde(default, alias = "quizId")]
    pub quiz_id: Option<i64>,

    #[serde(default, alias = "answerTimeMs")]
    #[validate(range(min = 0, max = 86_400_000, message = "answer_time_ms is out of range"))]
    pub answer_time_ms: Option<i64>,
}

impl SubmitAnswerRequest {
    /// `answer` wins over `selectedOption`; blank values count as missing.
    pub fn raw_answer(&self) -> Option<&str> {
        [self.answer.as_deref(), self.selected_option.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<String>,
}

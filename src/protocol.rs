use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub message: String,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl RunRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stream: false,
            model: None,
            user_id: None,
            session_id: None,
        }
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentRunResponse {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum AgentType {
    MealPlanningAgent,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::MealPlanningAgent => "meal_planning_agent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Model {
    #[serde(rename = "claude-opus-4-5")]
    #[value(name = "claude-opus-4-5")]
    ClaudeOpus45,
    #[serde(rename = "claude-sonnet-4-5")]
    #[value(name = "claude-sonnet-4-5")]
    ClaudeSonnet45,
    #[serde(rename = "claude-sonnet-4-0")]
    #[value(name = "claude-sonnet-4-0")]
    ClaudeSonnet40,
    #[serde(rename = "claude-opus-4-1")]
    #[value(name = "claude-opus-4-1")]
    ClaudeOpus41,
    #[serde(rename = "claude-haiku-4-5")]
    #[value(name = "claude-haiku-4-5")]
    ClaudeHaiku45,
    #[serde(rename = "gpt-5-mini")]
    #[value(name = "gpt-5-mini")]
    Gpt5Mini,
    #[serde(rename = "gpt-5.2-2025-12-11")]
    #[value(name = "gpt-5.2-2025-12-11")]
    Gpt52,
    #[serde(rename = "gpt-4")]
    #[value(name = "gpt-4")]
    Gpt4,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::ClaudeOpus45 => "claude-opus-4-5",
            Model::ClaudeSonnet45 => "claude-sonnet-4-5",
            Model::ClaudeSonnet40 => "claude-sonnet-4-0",
            Model::ClaudeOpus41 => "claude-opus-4-1",
            Model::ClaudeHaiku45 => "claude-haiku-4-5",
            Model::Gpt5Mini => "gpt-5-mini",
            Model::Gpt52 => "gpt-5.2-2025-12-11",
            Model::Gpt4 => "gpt-4",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub id: i64,
    pub user_id: i64,

    pub chicken_dishes_per_week: u32,
    pub fish_dishes_per_week: u32,
    pub vegetables_required: bool,
    pub eating_out_days: Vec<String>,
    pub leftovers_for_lunch: bool,

    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub preferred_cuisines: Vec<String>,
    pub sauce_preference: String,
    pub easy_meal_preference: String,

    pub dietary_restrictions: Vec<String>,
    pub allergens: Vec<String>,
    pub avoid_meal_types: Vec<String>,
    pub other_items: Vec<String>,

    pub created_at: String,
    pub updated_at: String,
}

/// Partial update; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePreferencesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chicken_dishes_per_week: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fish_dishes_per_week: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vegetables_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eating_out_days: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leftovers_for_lunch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_cuisines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sauce_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub easy_meal_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergens: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avoid_meal_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_items: Option<Vec<String>>,
}

impl UpdatePreferencesRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

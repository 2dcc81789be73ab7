use serde::{Deserialize, Serialize};

pub type Timestamp = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_at: Timestamp,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
    /// Id of the owning category. Kept in sync by `AppState`.
    #[serde(default)]
    pub category_id: String,
}

impl Task {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default = "default_category_color")]
    pub color: String,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    DueDate,
    Priority,
    Title,
    CreatedAt,
}

impl SortOption {
    pub const ALL: [SortOption; 4] = [
        SortOption::DueDate,
        SortOption::Priority,
        SortOption::Title,
        SortOption::CreatedAt,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortOption::DueDate => "Due Date",
            SortOption::Priority => "Priority",
            SortOption::Title => "Title",
            SortOption::CreatedAt => "Created Date",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default)]
    pub sort_option: SortOption,
    #[serde(default = "default_show_completed")]
    pub show_completed: bool,
    /// Endpoint queried for cloud account availability.
    #[serde(default)]
    pub sync_status_url: Option<String>,
    #[serde(default)]
    pub sync_api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sort_option: SortOption::DueDate,
            show_completed: default_show_completed(),
            sync_status_url: None,
            sync_api_key: String::new(),
        }
    }
}

fn default_show_completed() -> bool {
    true
}

fn default_category_color() -> String {
    "007AFF".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoriesFile {
    pub schema_version: u32,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SettingsFile {
    pub schema_version: u32,
    pub settings: Settings,
}

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::events::StatePayload;
use crate::models::{Category, Settings, Task};
use crate::projector::{empty_state, project_view, EmptyState, SectionView, ViewOptions};
use crate::state::AppState;
use crate::storage::{Storage, StorageError};
use crate::sync::{AccountStatusProvider, SyncStatus, SyncStatusDisplay, SyncStatusMonitor};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Host services the presentation layer provides to the command layer.
pub trait CommandCtx {
    fn app_data_dir(&self) -> Result<PathBuf, StorageError>;
    fn emit_state_updated(&self, payload: StatePayload);
    fn emit_sync_status(&self, display: SyncStatusDisplay);
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectionPayload {
    pub sections: Vec<SectionView>,
    pub empty_state: Option<EmptyState>,
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn persist(ctx: &impl CommandCtx, state: &AppState) -> Result<(), StorageError> {
    let root = ctx.app_data_dir()?;
    let storage = Storage::new(root);
    storage.ensure_dirs()?;
    storage.save_categories(&state.categories_file())?;
    storage.save_settings(&state.settings_file())?;
    ctx.emit_state_updated(StatePayload {
        categories: state.categories(),
        settings: state.settings(),
    });
    Ok(())
}

fn persist_or_err<T>(ctx: &impl CommandCtx, state: &AppState, data: T) -> CommandResult<T> {
    match persist(ctx, state) {
        Ok(()) => ok(data),
        Err(error) => {
            log::error!("persist failed: {error}");
            err(&format!("storage error: {error}"))
        }
    }
}

/// Loads categories and settings from disk into `state`. Missing or
/// unreadable files fall back to an empty store and default settings.
pub fn load_state(
    ctx: &impl CommandCtx,
    state: &AppState,
) -> CommandResult<(Vec<Category>, Settings)> {
    let root = match ctx.app_data_dir() {
        Ok(path) => path,
        Err(e) => return err(&format!("app_data_dir error: {e}")),
    };
    let storage = Storage::new(root);
    if let Err(error) = storage.ensure_dirs() {
        return err(&format!("storage error: {error}"));
    }
    let categories = storage
        .load_categories()
        .map(|data| data.categories)
        .unwrap_or_else(|error| {
            log::warn!("using empty category list: {error}");
            Vec::new()
        });
    let settings = storage
        .load_settings()
        .map(|data| data.settings)
        .unwrap_or_else(|error| {
            log::warn!("using default settings: {error}");
            Settings::default()
        });
    state.replace_categories(categories);
    state.update_settings(settings.clone());
    log::info!("state loaded categories={}", state.categories().len());
    ok((state.categories(), settings))
}

pub fn create_category(
    ctx: &impl CommandCtx,
    state: &AppState,
    category: Category,
) -> CommandResult<Category> {
    if category.name.trim().is_empty() {
        return err("category name is empty");
    }
    if !state.add_category(category.clone()) {
        return err("category already exists");
    }
    persist_or_err(ctx, state, category)
}

pub fn update_category(
    ctx: &impl CommandCtx,
    state: &AppState,
    category: Category,
) -> CommandResult<Category> {
    if category.name.trim().is_empty() {
        return err("category name is empty");
    }
    match state.update_category(category) {
        Some(updated) => persist_or_err(ctx, state, updated),
        None => err("category not found"),
    }
}

pub fn delete_category(
    ctx: &impl CommandCtx,
    state: &AppState,
    category_id: String,
) -> CommandResult<bool> {
    if !state.remove_category(&category_id) {
        return err("category not found");
    }
    persist_or_err(ctx, state, true)
}

pub fn create_task(ctx: &impl CommandCtx, state: &AppState, task: Task) -> CommandResult<Task> {
    if task.title.trim().is_empty() {
        return err("title is empty");
    }
    if !state.categories().iter().any(|c| c.id == task.category_id) {
        return err("category not found");
    }
    if !state.add_task(task.clone()) {
        return err("task already exists");
    }
    persist_or_err(ctx, state, task)
}

pub fn update_task(ctx: &impl CommandCtx, state: &AppState, task: Task) -> CommandResult<Task> {
    if task.title.trim().is_empty() {
        return err("title is empty");
    }
    match state.update_task(task) {
        Some(stored) => persist_or_err(ctx, state, stored),
        None => err("task not found"),
    }
}

pub fn toggle_task_completion(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
) -> CommandResult<Task> {
    let now = Utc::now().timestamp();
    match state.toggle_task_completion(&task_id, now) {
        Some(task) => persist_or_err(ctx, state, task),
        None => err("task not found"),
    }
}

pub fn rename_task(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
    title: String,
) -> CommandResult<Task> {
    let title = title.trim();
    if title.is_empty() {
        return err("title is empty");
    }
    let now = Utc::now().timestamp();
    match state.rename_task(&task_id, title, now) {
        Some(task) => persist_or_err(ctx, state, task),
        None => err("task not found"),
    }
}

pub fn delete_task(ctx: &impl CommandCtx, state: &AppState, task_id: String) -> CommandResult<bool> {
    if !state.remove_task(&task_id) {
        return err("task not found");
    }
    persist_or_err(ctx, state, true)
}

pub fn delete_tasks(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_ids: Vec<String>,
) -> CommandResult<bool> {
    let removed = state.remove_tasks(&task_ids);
    if removed == 0 {
        return err("task not found");
    }
    log::debug!("deleted {removed} of {} requested tasks", task_ids.len());
    persist_or_err(ctx, state, true)
}

/// Remembers the sort option and completed-visibility. Search text is not persisted.
pub fn update_view_options(
    ctx: &impl CommandCtx,
    state: &AppState,
    options: ViewOptions,
) -> CommandResult<Settings> {
    let previous = state.settings();
    let mut settings = previous.clone();
    settings.sort_option = options.sort_option;
    settings.show_completed = options.show_completed;
    state.update_settings(settings.clone());
    if let Err(error) = persist(ctx, state) {
        // Roll back in-memory settings to keep the running app consistent.
        state.update_settings(previous);
        return err(&format!("storage error: {error}"));
    }
    ok(settings)
}

pub fn project_sections(state: &AppState, options: ViewOptions) -> CommandResult<ProjectionPayload> {
    let snapshot = state.categories();
    let sections = project_view(&snapshot, &options);
    let empty_state = empty_state(&snapshot, &sections, &options.search_text);
    ok(ProjectionPayload {
        sections: sections.iter().map(|section| section.to_view()).collect(),
        empty_state,
    })
}

pub fn seed_sample_data(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<bool> {
    if !state.seed_sample_data(Utc::now().timestamp()) {
        return ok(false);
    }
    persist_or_err(ctx, state, true)
}

/// Runs one account check and emits the display state before and after it.
pub async fn check_sync_status<P: AccountStatusProvider>(
    ctx: &impl CommandCtx,
    monitor: &SyncStatusMonitor<P>,
) -> CommandResult<SyncStatusDisplay> {
    ctx.emit_sync_status(SyncStatusDisplay::from(SyncStatus::Checking));
    monitor.check().await;
    // A newer check may have won; report what the monitor now shows.
    let display = SyncStatusDisplay::from(monitor.status());
    ctx.emit_sync_status(display.clone());
    ok(display)
}

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::models::{CategoriesFile, Category, Settings, SettingsFile, Task, Timestamp};
use crate::projector::{project_view, SectionView, ViewOptions};

const SCHEMA_VERSION: u32 = 1;

const DAY_SECS: i64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(categories: Vec<Category>, settings: Settings) -> Self {
        let categories = normalize_categories(categories);
        Self {
            inner: Arc::new(Mutex::new(AppData {
                categories,
                settings,
            })),
        }
    }

    pub fn categories_file(&self) -> CategoriesFile {
        let guard = self.inner.lock().expect("state poisoned");
        CategoriesFile {
            schema_version: SCHEMA_VERSION,
            categories: guard.categories.clone(),
        }
    }

    pub fn settings_file(&self) -> SettingsFile {
        let guard = self.inner.lock().expect("state poisoned");
        SettingsFile {
            schema_version: SCHEMA_VERSION,
            settings: guard.settings.clone(),
        }
    }

    pub fn categories(&self) -> Vec<Category> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.categories.clone()
    }

    pub fn replace_categories(&self, categories: Vec<Category>) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.categories = normalize_categories(categories);
    }

    /// Projects a snapshot of the current categories. The lock is released
    /// before projecting.
    pub fn sections(&self, options: &ViewOptions) -> Vec<SectionView> {
        let snapshot = self.categories();
        project_view(&snapshot, options)
            .iter()
            .map(|section| section.to_view())
            .collect()
    }

    /// Rejects a duplicate category id, or tasks whose ids are already
    /// stored or repeated within `category`.
    pub fn add_category(&self, category: Category) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        if guard.categories.iter().any(|c| c.id == category.id) {
            return false;
        }
        let mut seen: HashSet<&str> = guard
            .categories
            .iter()
            .flat_map(|c| c.tasks.iter().map(|t| t.id.as_str()))
            .collect();
        if !category.tasks.iter().all(|t| seen.insert(t.id.as_str())) {
            log::warn!("category {} carries a task id that already exists", category.id);
            return false;
        }
        guard.categories.push(normalize_category(category));
        true
    }

    /// Updates name and color. Tasks are left as they are.
    pub fn update_category(&self, category: Category) -> Option<Category> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let existing = guard.categories.iter_mut().find(|c| c.id == category.id)?;
        existing.name = category.name;
        existing.color = category.color;
        Some(existing.clone())
    }

    /// Removes a category together with all of its tasks.
    pub fn remove_category(&self, category_id: &str) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let before = guard.categories.len();
        guard.categories.retain(|c| c.id != category_id);
        guard.categories.len() != before
    }

    pub fn add_task(&self, task: Task) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        if find_task(&guard.categories, &task.id).is_some() {
            return false;
        }
        match guard.categories.iter_mut().find(|c| c.id == task.category_id) {
            Some(category) => {
                category.tasks.push(task);
                true
            }
            None => false,
        }
    }

    /// Replaces a task and returns it as stored. A changed `category_id`
    /// moves the task to the end of that category; an empty one keeps the
    /// current category.
    pub fn update_task(&self, mut task: Task) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let (category_index, task_index) = find_task(&guard.categories, &task.id)?;
        if task.category_id.is_empty() {
            task.category_id = guard.categories[category_index].id.clone();
        }
        let target_index = guard
            .categories
            .iter()
            .position(|c| c.id == task.category_id)?;

        let stored = task.clone();
        if target_index == category_index {
            guard.categories[category_index].tasks[task_index] = task;
        } else {
            guard.categories[category_index].tasks.remove(task_index);
            guard.categories[target_index].tasks.push(task);
        }
        Some(stored)
    }

    pub fn toggle_task_completion(&self, task_id: &str, now: Timestamp) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let (category_index, task_index) = find_task(&guard.categories, task_id)?;
        let task = &mut guard.categories[category_index].tasks[task_index];
        task.completed = !task.completed;
        task.completed_at = task.completed.then_some(now);
        task.updated_at = now;
        Some(task.clone())
    }

    pub fn rename_task(&self, task_id: &str, title: &str, now: Timestamp) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let (category_index, task_index) = find_task(&guard.categories, task_id)?;
        let task = &mut guard.categories[category_index].tasks[task_index];
        task.title = title.to_string();
        task.updated_at = now;
        Some(task.clone())
    }

    pub fn remove_task(&self, task_id: &str) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let Some((category_index, task_index)) = find_task(&guard.categories, task_id) else {
            return false;
        };
        guard.categories[category_index].tasks.remove(task_index);
        true
    }

    /// Returns how many of `task_ids` were found and removed.
    pub fn remove_tasks(&self, task_ids: &[String]) -> usize {
        let mut guard = self.inner.lock().expect("state poisoned");
        let mut removed = 0;
        for category in guard.categories.iter_mut() {
            let before = category.tasks.len();
            category.tasks.retain(|task| !task_ids.contains(&task.id));
            removed += before - category.tasks.len();
        }
        removed
    }

    /// Inserts the demo categories and tasks unless "Work" or "Personal"
    /// already exist. Returns whether anything was inserted.
    pub fn seed_sample_data(&self, now: Timestamp) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let seeded = guard
            .categories
            .iter()
            .any(|c| c.name == "Work" || c.name == "Personal");
        if seeded {
            log::info!("sample data already exists");
            return false;
        }
        guard.categories.extend(sample_categories(now));
        log::info!("sample data created");
        true
    }

    pub fn settings(&self) -> Settings {
        let guard = self.inner.lock().expect("state poisoned");
        guard.settings.clone()
    }

    pub fn update_settings(&self, settings: Settings) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.settings = settings;
    }
}

#[derive(Debug)]
struct AppData {
    categories: Vec<Category>,
    settings: Settings,
}

// Task ids are unique across categories; later duplicates are dropped.
fn normalize_categories(categories: Vec<Category>) -> Vec<Category> {
    let mut seen = HashSet::new();
    categories
        .into_iter()
        .map(|mut category| {
            category.tasks.retain(|task| {
                let fresh = seen.insert(task.id.clone());
                if !fresh {
                    log::warn!(
                        "dropping duplicate task id={} in category={}",
                        task.id,
                        category.id
                    );
                }
                fresh
            });
            normalize_category(category)
        })
        .collect()
}

fn normalize_category(mut category: Category) -> Category {
    for task in &mut category.tasks {
        if task.category_id != category.id {
            task.category_id = category.id.clone();
        }
    }
    category
}

fn find_task(categories: &[Category], task_id: &str) -> Option<(usize, usize)> {
    categories.iter().enumerate().find_map(|(category_index, category)| {
        category
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .map(|task_index| (category_index, task_index))
    })
}

fn sample_categories(now: Timestamp) -> Vec<Category> {
    let mut work = sample_category("work", "Work", "007AFF", now);
    let mut personal = sample_category("personal", "Personal", "34C759", now);
    let shopping = sample_category("shopping", "Shopping", "FF9500", now);

    work.tasks.push(sample_task(
        &work.id,
        format!("sample-task-1-{now}"),
        "Finish storage project",
        Some("Complete the task manager storage layer"),
        now + DAY_SECS,
        2,
        now,
    ));

    let mut groceries = sample_task(
        &personal.id,
        format!("sample-task-2-{now}"),
        "Buy groceries",
        None,
        now + DAY_SECS / 2,
        1,
        now,
    );
    // One completed task so the completion filter has something to hide.
    groceries.completed = true;
    groceries.completed_at = Some(now);
    personal.tasks.push(groceries);

    work.tasks.push(sample_task(
        &work.id,
        format!("sample-task-3-{now}"),
        "Meeting with team",
        Some("Weekly team sync"),
        now + 2 * DAY_SECS,
        3,
        now,
    ));

    vec![work, personal, shopping]
}

fn sample_category(key: &str, name: &str, color: &str, now: Timestamp) -> Category {
    Category {
        id: format!("sample-{key}-{now}"),
        name: name.to_string(),
        color: color.to_string(),
        created_at: now,
        tasks: Vec::new(),
    }
}

fn sample_task(
    category_id: &str,
    id: String,
    title: &str,
    description: Option<&str>,
    due_at: Timestamp,
    priority: i32,
    now: Timestamp,
) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: description.map(|d| d.to_string()),
        due_at,
        priority,
        completed: false,
        completed_at: None,
        created_at: now,
        updated_at: now,
        category_id: category_id.to_string(),
    }
}

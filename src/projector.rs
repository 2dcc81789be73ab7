//! Derives render-ready category sections from a snapshot of categories.
//!
//! Everything here is a pure function of its inputs: the snapshot is only
//! borrowed, and each call allocates fresh section lists.

use serde::{Deserialize, Serialize, Serializer};

use crate::models::{Category, SortOption, Task};

/// A category paired with the tasks that survived filtering, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySection<'a> {
    #[serde(serialize_with = "serialize_category_header")]
    pub category: &'a Category,
    pub tasks: Vec<&'a Task>,
}

impl CategorySection<'_> {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn to_view(&self) -> SectionView {
        SectionView {
            category_id: self.category.id.clone(),
            name: self.category.name.clone(),
            color: self.category.color.clone(),
            tasks: self.tasks.iter().map(|task| (*task).clone()).collect(),
        }
    }
}

/// Owned form of a section, for handing across the command boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SectionView {
    pub category_id: String,
    pub name: String,
    pub color: String,
    pub tasks: Vec<Task>,
}

fn serialize_category_header<S>(category: &&Category, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    #[derive(Serialize)]
    struct Header<'a> {
        id: &'a str,
        name: &'a str,
        color: &'a str,
    }

    Header {
        id: &category.id,
        name: &category.name,
        color: &category.color,
    }
    .serialize(serializer)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ViewOptions {
    #[serde(default)]
    pub search_text: String,
    #[serde(default)]
    pub sort_option: SortOption,
    #[serde(default = "default_show_completed")]
    pub show_completed: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            sort_option: SortOption::DueDate,
            show_completed: default_show_completed(),
        }
    }
}

fn default_show_completed() -> bool {
    true
}

/// Filter, sort and group `categories` for display.
///
/// Categories keep their input order. While `search_text` is empty every
/// category is emitted, even with no tasks, so the caller can render an
/// empty-state row. While searching, categories without a match are dropped.
pub fn project<'a>(
    categories: &'a [Category],
    search_text: &str,
    sort_option: SortOption,
    show_completed: bool,
) -> Vec<CategorySection<'a>> {
    let needle = search_text.to_lowercase();
    categories
        .iter()
        .filter_map(|category| {
            let tasks = filter_and_sort_tasks(category, &needle, sort_option, show_completed);
            if tasks.is_empty() && !search_text.is_empty() {
                return None;
            }
            Some(CategorySection { category, tasks })
        })
        .collect()
}

pub fn project_view<'a>(categories: &'a [Category], options: &ViewOptions) -> Vec<CategorySection<'a>> {
    project(
        categories,
        &options.search_text,
        options.sort_option,
        options.show_completed,
    )
}

/// `needle` must already be lowercased. An empty needle disables the search filter.
fn filter_and_sort_tasks<'a>(
    category: &'a Category,
    needle: &str,
    sort_option: SortOption,
    show_completed: bool,
) -> Vec<&'a Task> {
    let category_matches = !needle.is_empty() && contains_folded(&category.name, needle);

    let mut tasks: Vec<&Task> = category
        .tasks
        .iter()
        .filter(|task| {
            needle.is_empty()
                || category_matches
                || contains_folded(&task.title, needle)
                || contains_folded(task.description(), needle)
        })
        .filter(|task| show_completed || !task.completed)
        .collect();

    sort_tasks(&mut tasks, sort_option);
    tasks
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

// `sort_by` is stable, so equal keys keep their filtered order.
fn sort_tasks(tasks: &mut [&Task], sort_option: SortOption) {
    match sort_option {
        SortOption::DueDate => tasks.sort_by(|a, b| a.due_at.cmp(&b.due_at)),
        SortOption::Priority => tasks.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortOption::Title => tasks.sort_by(|a, b| a.title.cmp(&b.title)),
        SortOption::CreatedAt => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

/// Placeholder the presentation layer shows when nothing is left to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EmptyState {
    pub searching: bool,
}

impl EmptyState {
    pub fn message(&self) -> &'static str {
        "No tasks found"
    }

    pub fn hint(&self) -> Option<&'static str> {
        self.searching.then_some("Try a different search term")
    }
}

/// Returns the placeholder to show when categories exist but no section survived.
pub fn empty_state(
    categories: &[Category],
    sections: &[CategorySection<'_>],
    search_text: &str,
) -> Option<EmptyState> {
    if categories.is_empty() || !sections.is_empty() {
        return None;
    }
    Some(EmptyState {
        searching: !search_text.is_empty(),
    })
}

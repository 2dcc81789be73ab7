//! Search/sort/filter projection of categorized tasks, plus cloud sync
//! status tracking for the banner shown above the list.

pub mod cloud;
pub mod commands;
pub mod events;
pub mod logging;
pub mod models;
pub mod projector;
pub mod state;
pub mod storage;
pub mod sync;

pub use models::{Category, Settings, SortOption, Task, Timestamp};
pub use projector::{project, project_view, CategorySection, SectionView, ViewOptions};
pub use state::AppState;
pub use sync::{AccountStatus, AccountStatusProvider, SyncStatus, SyncStatusMonitor};

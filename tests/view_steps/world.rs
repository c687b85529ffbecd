//! Shared world state for view bootstrap BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskboard::bootstrap::BootstrapError;
use taskboard::store::adapters::memory::InMemoryDocumentStore;
use taskboard::task::services::TaskService;
use taskboard::team::domain::{MemberId, Team};
use taskboard::team::repository::TeamMemberRepository;
use taskboard::team::services::TeamService;
use taskboard::view::domain::ViewCatalog;
use taskboard::view::services::{EnsureReport, ViewManager, ViewManagerError};

/// Scenario world for view bootstrap behaviour tests.
pub struct ViewWorld {
    pub store: Arc<InMemoryDocumentStore>,
    pub catalog: Arc<ViewCatalog>,
    pub tasks: TaskService<InMemoryDocumentStore, DefaultClock>,
    pub teams: TeamService<InMemoryDocumentStore>,
    pub members: TeamMemberRepository<InMemoryDocumentStore>,
    pub team: Option<Team>,
    pub member: Option<MemberId>,
    pub last_bootstrap: Option<Result<EnsureReport, BootstrapError>>,
    pub last_refresh: Option<Result<EnsureReport, ViewManagerError>>,
}

impl ViewWorld {
    /// Creates a world over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        Self {
            catalog: Arc::new(ViewCatalog::standard()),
            tasks: TaskService::new(Arc::clone(&store), Arc::new(DefaultClock)),
            teams: TeamService::new(Arc::clone(&store)),
            members: TeamMemberRepository::new(Arc::clone(&store)),
            store,
            team: None,
            member: None,
            last_bootstrap: None,
            last_refresh: None,
        }
    }

    /// Returns a view manager over the world's store and catalog.
    #[must_use]
    pub fn view_manager(&self) -> ViewManager<InMemoryDocumentStore> {
        ViewManager::new(Arc::clone(&self.store), Arc::clone(&self.catalog))
    }
}

impl Default for ViewWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ViewWorld {
    ViewWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

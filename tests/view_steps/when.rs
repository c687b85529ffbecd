//! When steps for view bootstrap BDD scenarios.

use super::world::{ViewWorld, run_async};
use rstest_bdd_macros::when;
use std::sync::Arc;
use taskboard::bootstrap::bootstrap;

#[when("the application bootstraps")]
fn application_bootstraps(world: &mut ViewWorld) {
    let result = run_async(bootstrap(
        Arc::clone(&world.store),
        Arc::clone(&world.catalog),
    ));
    world.last_bootstrap = Some(result);
}

#[when("the views are refreshed")]
fn views_refreshed(world: &mut ViewWorld) {
    let manager = world.view_manager();
    world.last_refresh = Some(run_async(manager.refresh_views()));
}

pub mod fixtures;
pub mod mocks;

#[allow(unused_imports)]
pub use fixtures::{fast_config, scenario_catalog};
#[allow(unused_imports)]
pub use mocks::MockSession;

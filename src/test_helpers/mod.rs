//! A set of helpers for testing

mod clock;
mod controller;
mod location;

pub use clock::ManualClock;
pub use controller::{
    TEST_STATE_KEY, create_always_allow_controller, create_test_controller,
    create_test_controller_with_backend, create_test_sqlite_repository,
};
pub use location::LocationBuilder;

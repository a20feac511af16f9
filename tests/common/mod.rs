#![allow(dead_code, unused_imports)]

use std::error::Error;

pub use hashbuild_test_utils::builders::TestProject;
pub use hashbuild_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

//! External process adapters.

mod system;

pub use system::SystemCommandRunner;

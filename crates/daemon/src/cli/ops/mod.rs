pub mod daemon;
pub mod health;
pub mod init;
pub mod open;
pub mod send;
pub mod version;

pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use open::OpenSecret;
pub use send::SendSecret;
pub use version::Version;

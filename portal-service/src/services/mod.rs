pub mod acl;
pub mod catalog;
pub mod directory;
pub mod email;
pub mod session;
pub mod sharing;
pub mod slack;
pub mod user_store;

pub use acl::{AclStore, InMemoryAclStore};
pub use catalog::{InMemoryLocusListStore, InMemoryProjectStore, LocusListStore, ProjectStore};
pub use directory::{CollaboratorDirectory, DirectorySettings};
pub use email::{MockNotifier, Notifier, SmtpNotifier};
pub use session::SessionStore;
pub use sharing::{Direction, MigrationSummary, SharingMigrator};
pub use slack::SlackClient;
pub use user_store::{InMemoryUserStore, UserStore};

pub mod acl;
pub mod locus_list;
pub mod policy;
pub mod project;
pub mod user;

pub use acl::{AccessGrant, Permission, Principal, Resource};
pub use locus_list::LocusList;
pub use policy::UserPolicy;
pub use project::Project;
pub use user::{CollaboratorRecord, User, UserOption};

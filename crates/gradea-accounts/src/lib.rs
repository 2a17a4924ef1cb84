//! GradeA account backend.
//!
//! Team-based account registration for a student management app:
//! - Administrators sign up with a unique Team ID
//! - Students join a team by presenting that Team ID
//! - Role resolution and sign-in route each account to its dashboard
//!
//! Credentials live with the identity provider; every directory record lives
//! in the document store. Multi-record writes go through one atomic batch.

pub mod api;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod directory;
pub mod error;
pub mod messaging;
pub mod profile;
pub mod records;
pub mod registrar;
pub mod roles;
pub mod session;

pub use backend::Backend;
pub use config::Config;
pub use dashboard::{CountWatch, TeamDashboard};
pub use directory::TeamDirectory;
pub use error::AccountError;
pub use messaging::Messaging;
pub use profile::ProfileService;
pub use records::{Account, AdminRecord, Profile, Role, StudentRecord, TeamId};
pub use registrar::{AccountRegistrar, AdminRegistration, StudentRegistration};
pub use roles::RoleResolver;
pub use session::SessionGateway;

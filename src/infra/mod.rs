//! Infrastructure layer - Database, repositories, and external collaborators.

pub mod db;
pub mod mailer;
pub mod repositories;

pub use db::{Database, Migrator};
pub use mailer::{Mailer, SmtpMailer};

#[cfg(test)]
pub use mailer::MockMailer;

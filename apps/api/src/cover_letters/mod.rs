// Saved cover letters: section parsing, versioned edits, and their routes.

pub mod handlers;
pub mod manager;
pub mod sections;

pub use manager::CoverLetterManager;

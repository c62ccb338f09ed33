//! Error types for the lessons and the CLI

use core_types::Rejection;
use thiserror::Error;
use web_platform::RoutesError;

/// Lesson-level errors
#[derive(Debug, Error)]
pub enum LessonError {
    /// The routes file could not be loaded
    #[error(transparent)]
    Routes(#[from] RoutesError),

    /// A lesson ended with a rejection nobody caught
    #[error("Uncaught (in promise) {0}")]
    Uncaught(#[from] Rejection),

    /// The event loop went idle with the lesson still pending
    #[error("lesson never settled")]
    Stalled,
}

/// Result type for lesson operations
pub type LessonResult<T> = Result<T, LessonError>;

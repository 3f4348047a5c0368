pub mod bank;
pub mod certificate;
pub mod config;
pub mod db;
pub mod error;
pub mod grading;
pub mod models;
pub mod progress;
pub mod routes;
pub mod session;
pub mod timer;

pub use bank::QuestionBank;
pub use error::QuizError;
pub use progress::ProgressStore;
pub use session::{Advance, QuizSession};

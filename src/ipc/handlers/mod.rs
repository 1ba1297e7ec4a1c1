pub mod backup;
pub mod core;
pub mod dataset;
pub mod seating;
pub mod session;
pub mod students;

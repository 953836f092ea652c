pub mod attendance;
pub mod dashboard;
pub mod report;
pub mod settings;
pub mod student;
pub mod subject;

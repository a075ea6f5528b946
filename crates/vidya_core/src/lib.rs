pub mod board;
pub mod domain;
pub mod ports;
pub mod registry;

#[cfg(test)]
pub(crate) mod testsupport;

pub use board::QuestionBoard;
pub use domain::{
    BoardEvent, FinishedSession, Identity, InstructorSessions, Question, QuestionFilter,
    QuestionPatch, QuestionStatus, Role, Session,
};
pub use ports::{BoardStore, EventStream, Notifier, PortError, PortResult};
pub use registry::SessionRegistry;

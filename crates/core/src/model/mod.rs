mod filter;
mod history;
mod ids;
mod marks;
mod question;

pub use filter::{FilterState, FilterTag, FilterTagError};
pub use history::{History, HistoryEntry, SessionStats};
pub use ids::{ParseIdError, QuestionId, USER_ID_LEN, USER_ID_QUERY_PARAM, UserId, UserIdError};
pub use marks::MarkSet;
pub use question::{OptionStatus, Question, QuestionError, QuizOption};

mod controller;
mod draft;
mod handle;
mod progress;
mod report;

// Public API of the session subsystem.
pub use crate::error::{ReportError, SessionError};
pub use controller::SessionController;
pub use draft::AnswerDraft;
pub use handle::{SessionHandle, SessionSnapshot};
pub use progress::{Advance, SessionProgress, SessionState};
pub use report::{file_name as report_file_name, render as render_report, ReportExporter, ReportInput};

pub(crate) use handle::lock_draft;

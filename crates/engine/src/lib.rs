pub mod analytics;
pub mod events;
pub mod judgment;
pub mod layout;
pub mod sequencer;
pub mod session;
pub mod tracker;

pub use analytics::ScoreCard;
pub use events::{EventLog, FeedbackSink, NoteId, NullSink, PlaybackStatus, PracticeEvent};
pub use judgment::{classify, HitType};
pub use layout::{TimingWindow, TimingWindows, WindowInfo};
pub use sequencer::{PlaybackState, Sequencer};
pub use session::PracticeSession;
pub use tracker::{ActiveNote, ActiveNoteTracker, HitState, UpdateRules};

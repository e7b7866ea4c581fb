pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use error::{StateError, StateResult};
pub use event::{SessionEvent, StateTransition};
pub use machine::SessionMachine;
pub use model::{DragKind, SessionState};

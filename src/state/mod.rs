//! Process-wide client state: the authenticated session, the active wedding
//! and the navigation flow derived from both.

pub mod gate;
pub mod session;
pub mod wedding;

pub use gate::{select_flow, Flow, NavigationGate, MAIN_TABS};
pub use session::{SessionSnapshot, SessionState};
pub use wedding::{ActiveWedding, WeddingSnapshot, ACTIVE_WEDDING_KEY};

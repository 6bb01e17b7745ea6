//! Solar calculator orchestration
//!
//! Ties location resolution and the prediction client together behind one
//! explicit session state, and derives the figures shown to the user.

pub mod calculator;
pub mod derive;
pub mod service;
pub mod session;

pub use calculator::Calculator;
pub use derive::DisplayFigures;
pub use service::CalculatorMessage;
pub use session::{Prediction, ResolutionTicket, Session, SubmitTicket};

//! Alert fan-out to the notification gateway.

pub mod dispatcher;
pub mod outcome;
mod sender;

pub use dispatcher::AlertDispatcher;
pub use outcome::{
    AudienceEstimate, DeliveryOutcome, DeliveryReport, DispatchResult, SendFailure,
};

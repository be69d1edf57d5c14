//! Conversational engine: keyword intent classification, reply generation
//! and the session that carries the message log.

pub mod courses;
pub mod responder;
pub mod rules;
pub mod session;
pub mod types;

pub use responder::ResponseGenerator;
pub use rules::{IntentClassifier, IntentRule, Trigger};
pub use session::{DialogueDeps, DialogueSession};
pub use types::{
    Action, Command, DomainContext, Guidelines, IntentTag, Message, MessageBody, ResponsePayload,
    Route, Sender, TipTopic,
};

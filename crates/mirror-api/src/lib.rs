//! HTTP surface of Mirror: route dispatch, the message and user services,
//! and the error taxonomy they answer with.

pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod palindrome;
pub mod routes;
pub mod users;

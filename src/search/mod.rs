pub mod dispatch;
pub mod fusion;
pub mod pipeline;
pub mod validator;

pub mod action;
pub mod coordinator;
pub mod desktop;
pub mod dispatcher;
pub mod keys;
pub mod native;

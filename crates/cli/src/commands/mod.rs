pub mod chat;
pub mod clear;
pub mod doctor;
pub mod history;
pub mod onboard;
pub mod runtime;
pub mod sessions;

pub mod activity;
pub mod api_token;
pub mod board;
pub mod chat;
pub mod member;
pub mod notification;
pub mod optimizer;
pub mod stage;
pub mod stalled;
pub mod stats;
pub mod task;

#[cfg(test)]
pub(crate) mod testutil;

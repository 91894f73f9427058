//! # market-service
//!
//! Application layer: the chat delivery engine, presence updates, and the
//! DTOs exchanged with the gateway.

pub mod dto;
pub mod services;

pub use services::{
    BackgroundTasks, ChatService, IdempotencyStore, PresenceService, SendMessageCommand,
    ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
};

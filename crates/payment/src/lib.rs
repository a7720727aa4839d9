//! Payment gateway adapter.
//!
//! The order core treats the payment provider as an opaque service with two
//! operations: create a QR payment request for an amount, and report the
//! status of a previously created request. This crate provides the trait,
//! the provider wire types (including the asynchronous webhook payload), an
//! in-memory gateway for tests and demos, and a REST client for a QRIS-style
//! provider.

mod gateway;
mod memory;
mod notification;
mod qris;

pub use gateway::{PaymentError, PaymentGateway, PaymentRequest, PaymentRequestStatus, Result};
pub use memory::InMemoryPaymentGateway;
pub use notification::{NotificationStatus, WebhookNotification, WebhookPaymentData};
pub use qris::QrisGateway;

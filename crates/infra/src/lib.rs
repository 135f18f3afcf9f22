//! `tutorhub-infra` — persistence and the checkout/fulfillment services.
//!
//! The [`store::MarketplaceStore`] trait has two implementations: an
//! in-memory store for dev/test and a Postgres store (`sqlx`). The
//! [`checkout::CheckoutService`] drives the payment-to-fulfillment flow on
//! top of a store and a [`tutorhub_payments::CheckoutProvider`].

pub mod checkout;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use checkout::{BookingRequest, CheckoutRedirect, CheckoutRequest, CheckoutService, FulfillmentOutcome};
pub use store::{InMemoryStore, MarketplaceStore, PostgresStore, StoreError, StoreResult};

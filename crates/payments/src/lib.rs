//! `tutorhub-payments` — the hosted-checkout provider boundary.
//!
//! A purchase never creates local state before payment: everything the
//! fulfillment side needs travels as opaque session metadata on the
//! provider's side ([`PurchaseIntent`]). The [`CheckoutProvider`] trait has
//! two implementations: an HTTP client for a Stripe-compatible API and an
//! in-memory provider for dev/test.

pub mod intent;
pub mod memory;
pub mod provider;
pub mod stripe;

pub use intent::{Fulfillment, PurchaseIntent};
pub use memory::InMemoryCheckout;
pub use provider::{CheckoutProvider, CreateSessionRequest, HostedSession, ProviderError};
pub use stripe::StripeCheckout;

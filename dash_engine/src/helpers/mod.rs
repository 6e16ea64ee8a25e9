mod fees;
mod webhook_signature;

pub use fees::{DeliveryFee, FeePolicy, PayoutSplit, UnknownFeePolicy};
pub use webhook_signature::{sign_payload, verify_signature, WebhookSignatureError, SIGNATURE_HEADER};

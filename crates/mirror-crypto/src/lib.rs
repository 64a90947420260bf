/// Mirror Crypto Library
///
/// API keys are bearer secrets handed to a user once at registration.
/// Only a SHA-256 digest is persisted; lookups hash the presented key and
/// compare digests, so the hash has to be deterministic (no salt).

pub mod keys;

//! # Route Modules
//!
//! | Prefix | Module |
//! |--------|--------|
//! | `/api/verify` | [`verify`] |
//! | `/v1/circles/*`, `/v1/payouts` | [`circles`] |
//! | `/v1/users/*` | [`users`] |

pub mod circles;
pub mod users;
pub mod verify;

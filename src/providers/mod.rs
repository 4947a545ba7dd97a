//! Transport implementations.
//!
//! Each transport implements the [`Transport`](crate::Transport) trait and
//! encapsulates exactly one gateway's protocol and auth details. Retry and
//! fallback live in the orchestrator, not here.
//!
//! | Transport | Identity | Role |
//! |-----------|----------|------|
//! | [`MailpitTransport`] | `mailpit` | local SMTP sandbox (test mode) |
//! | [`MailjetTransport`] | `mailjet` | Mailjet Send API v3.1 |
//! | [`ResendTransport`] | `resend` | Resend API |

mod mailpit;
pub use mailpit::MailpitTransport;

mod mailjet;
pub use mailjet::MailjetTransport;

mod resend;
pub use resend::ResendTransport;

pub mod dispatch;
pub mod lifecycle;
pub mod messages;
pub mod onboarding;
pub mod pricing;
pub mod queue;
pub mod router;
pub mod session;

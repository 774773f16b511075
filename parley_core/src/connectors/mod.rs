// Slack Web API connector (the only upstream)
pub mod slack;

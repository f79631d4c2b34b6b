pub mod admin_session;
pub mod serviceability_redirect;

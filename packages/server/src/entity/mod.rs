pub mod agent;
pub mod avatar;

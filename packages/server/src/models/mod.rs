pub mod agent;
pub mod avatar;
pub mod traits;

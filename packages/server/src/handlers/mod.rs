pub mod agent;
pub mod assets;
pub mod avatar;
pub mod claim;
pub mod traits;

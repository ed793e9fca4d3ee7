pub mod apikey;
pub mod filename;

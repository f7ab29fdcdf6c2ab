pub mod health;
pub mod impersonate;

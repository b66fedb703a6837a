pub mod rede_social;
pub mod usuario;

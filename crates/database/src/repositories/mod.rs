pub mod overrides;
pub mod permissions;
pub mod procedures;
pub mod roles;
pub mod submissions;
pub mod users;

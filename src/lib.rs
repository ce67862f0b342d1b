pub mod config;
pub mod error;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod store;

pub mod crypto {
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod profile;
    pub mod resume;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod profile;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod profile;
    pub mod resume;
    pub mod session;
}

pub mod handlers {
    pub mod auth;
    pub mod profile;
    pub mod resume;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod auth;
}

pub mod config;
pub mod error;
pub mod domain {
    pub mod payment;
    pub mod registration;
}
pub mod gateway;
pub mod notify;
pub mod service {
    pub mod payment_service;
    pub mod reconcile;
    pub mod registration_service;
}
pub mod store;
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod payments;
        pub mod register;
    }
}

#[derive(Clone)]
pub struct AppState {
    pub payments: service::payment_service::PaymentService,
    pub registrations: service::registration_service::RegistrationService,
}
